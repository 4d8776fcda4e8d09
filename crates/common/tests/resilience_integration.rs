//! Integration tests for resilience module
//!
//! Tests retry orchestration with transient and permanent failures and with
//! external cancellation

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use berth_common::RetryPolicy;
use berth_domain::BerthError;
use tokio_util::sync::CancellationToken;

/// Validates that backoff delays double between attempts.
///
/// # Test Steps
/// 1. Configure 3 retries with a 20ms base delay
/// 2. Fail every attempt with a connection error
/// 3. Confirm 4 attempts and at least 20 + 40 + 80 ms of waiting
#[tokio::test(flavor = "multi_thread")]
async fn test_retry_exponential_backoff_exhaustion() {
    let attempts = Arc::new(AtomicU32::new(0));
    let policy = RetryPolicy::new(3, Duration::from_millis(20));
    let cancel = CancellationToken::new();

    let started = Instant::now();
    let result: Result<(), _> = policy
        .execute("test", &cancel, || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(BerthError::Connection("connection reset".into()))
            }
        })
        .await;

    assert_eq!(result, Err(BerthError::Connection("connection reset".into())));
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    assert!(started.elapsed() >= Duration::from_millis(140));
}

/// Validates recovery from transient failures.
///
/// # Test Steps
/// 1. Fail the first two attempts with connection errors
/// 2. Succeed on the third
/// 3. Confirm exactly 3 attempts
#[tokio::test(flavor = "multi_thread")]
async fn test_retry_recovers_after_transient_failures() {
    let attempts = Arc::new(AtomicU32::new(0));
    let policy = RetryPolicy::new(5, Duration::from_millis(1));
    let cancel = CancellationToken::new();

    let result = policy
        .execute("test", &cancel, || {
            let attempts = Arc::clone(&attempts);
            async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(BerthError::Connection(format!("attempt {n} failed")))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

    assert_eq!(result, Ok(3));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

/// Validates that non-connection errors end the loop immediately.
#[tokio::test(flavor = "multi_thread")]
async fn test_retry_skips_permanent_failures() {
    for error in [
        BerthError::Api("Duplicate entry".into()),
        BerthError::not_found("Project", "shop"),
        BerthError::validation("scope", "unknown scope"),
    ] {
        let attempts = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let cancel = CancellationToken::new();

        let result: Result<(), _> = policy
            .execute("test", &cancel, || {
                let attempts = Arc::clone(&attempts);
                let error = error.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(error)
                }
            })
            .await;

        assert_eq!(result, Err(error));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}

/// Validates that a cancel signal fired from another task interrupts a long
/// backoff wait.
///
/// # Test Steps
/// 1. Configure a 10s base delay so the first wait would be long
/// 2. Cancel from a spawned task after 50ms
/// 3. Confirm `Cancelled` well before the first delay would have elapsed
#[tokio::test(flavor = "multi_thread")]
async fn test_cancellation_from_another_task() {
    let policy = RetryPolicy::new(3, Duration::from_secs(10));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result: Result<(), _> = policy
        .execute("test", &cancel, || async {
            Err(BerthError::Connection("timeout".into()))
        })
        .await;

    assert_eq!(result, Err(BerthError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
}
