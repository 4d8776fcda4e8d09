//! Bounded exponential-backoff retry with cancellation
//!
//! Only errors that [`BerthError::is_retryable`] accepts are retried: a
//! business rejection cannot succeed by repeating unchanged input. The wait
//! between attempts and the attempt itself both race against a
//! [`CancellationToken`], so an external cancel aborts immediately.

use std::future::Future;
use std::time::Duration;

use berth_domain::{BerthError, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Highest exponent applied to the base delay.
const MAX_BACKOFF_SHIFT: u32 = 8;

/// Retry configuration: `max_retries` retries after the first attempt, each
/// preceded by `base_delay * 2^(retry - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Initial try plus retries.
    pub const fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the given retry (1-based): 1s, 2s, 4s, ... for the
    /// default policy.
    pub fn delay_for(&self, retry_number: u32) -> Duration {
        let shift = retry_number.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        self.base_delay.saturating_mul(1u32 << shift)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// exhausts the retry budget, or `cancel` fires.
    ///
    /// # Errors
    /// Returns the first non-retryable error, the last retryable error once
    /// the budget is spent, or [`BerthError::Cancelled`].
    pub async fn execute<F, Fut, T>(
        &self,
        operation_name: &str,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.total_attempts();
        let mut attempt: u32 = 1;

        loop {
            if cancel.is_cancelled() {
                debug!(operation = operation_name, attempt, "cancelled before attempt");
                return Err(BerthError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(BerthError::Cancelled),
                result = operation() => result,
            };

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = operation_name, attempt, "succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) if attempt >= attempts => {
                    warn!(
                        operation = operation_name,
                        attempts,
                        error = %error,
                        "retry budget exhausted"
                    );
                    return Err(error);
                }
                Err(error) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation = operation_name,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "retrying after connection failure"
                    );
                    sleep_or_cancel(delay, cancel).await?;
                    attempt += 1;
                }
            }
        }
    }
}

async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> Result<()> {
    if delay.is_zero() {
        return Ok(());
    }
    tokio::select! {
        () = cancel.cancelled() => Err(BerthError::Cancelled),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}
