//! Integration tests for auth module
//!
//! Tests token lifecycle management under concurrent access

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use berth_common::{TokenManager, TokenRefresher};
use berth_domain::{BerthError, ErrorKind, Result};

struct SequenceRefresher {
    calls: AtomicUsize,
}

#[async_trait]
impl TokenRefresher for SequenceRefresher {
    async fn refresh(&self) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(25)).await;
        Ok(format!("token-{n}"))
    }
}

/// Validates double-checked refresh under contention.
///
/// # Test Steps
/// 1. Start without a token so the first access must refresh
/// 2. Spawn 16 tasks asking for the token at once
/// 3. Confirm one refresh and that every task saw the same token
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_access_refreshes_once() {
    let refresher = Arc::new(SequenceRefresher { calls: AtomicUsize::new(0) });
    let manager = Arc::new(TokenManager::refreshing(
        None,
        refresher.clone(),
        Duration::from_secs(3600),
        Duration::from_secs(300),
    ));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.access_token().await })
        })
        .collect();

    for handle in handles {
        let token = handle.await.expect("task should not panic").expect("refresh succeeds");
        assert_eq!(token.as_deref(), Some("token-1"));
    }
    assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
}

/// Validates that a TTL shorter than the threshold refreshes on every access.
///
/// # Test Steps
/// 1. Configure a 1s TTL with a 5s refresh threshold
/// 2. Read the token twice
/// 3. Confirm two refreshes with distinct tokens
#[tokio::test(flavor = "multi_thread")]
async fn test_short_ttl_refreshes_each_time() {
    let refresher = Arc::new(SequenceRefresher { calls: AtomicUsize::new(0) });
    let manager = TokenManager::refreshing(
        None,
        refresher.clone(),
        Duration::from_secs(1),
        Duration::from_secs(5),
    );

    assert_eq!(manager.access_token().await.unwrap().as_deref(), Some("token-1"));
    assert_eq!(manager.access_token().await.unwrap().as_deref(), Some("token-2"));
    assert_eq!(refresher.calls.load(Ordering::SeqCst), 2);
}

struct Unreachable;

#[async_trait]
impl TokenRefresher for Unreachable {
    async fn refresh(&self) -> Result<String> {
        Err(BerthError::Api("identity provider rejected the grant".into()))
    }
}

/// Validates that refresh failures are reported connection-class.
#[tokio::test(flavor = "multi_thread")]
async fn test_refresh_failure_is_connection_class() {
    let manager = TokenManager::refreshing(
        None,
        Arc::new(Unreachable),
        Duration::from_secs(3600),
        Duration::from_secs(300),
    );

    let err = manager.access_token().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.to_string().contains("rejected the grant"));
}

/// Validates that a static token is served as-is and never refreshed.
#[tokio::test(flavor = "multi_thread")]
async fn test_fixed_token_is_never_refreshed() {
    let manager = TokenManager::fixed("static-token");
    assert!(!manager.can_refresh());
    assert_eq!(manager.access_token().await.unwrap().as_deref(), Some("static-token"));
    assert!(manager.expires_at().await.is_none());
}
