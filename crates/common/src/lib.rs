//! Runtime building blocks shared across Berth crates.
//!
//! - `resilience`: retry orchestration with cancellable backoff
//! - `auth`: bearer token lifecycle with deduplicated refresh

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod resilience;

// Re-export commonly used types and traits for convenience
pub use auth::{TokenManager, TokenRefresher};
pub use resilience::RetryPolicy;
