//! Resilience patterns for transient transport failures
//!
//! - **Retry Logic**: bounded exponential backoff that only retries
//!   connection-class errors and honours a cancellation token

pub mod retry;

pub use retry::RetryPolicy;
