//! Bearer token management
//!
//! The client never talks to an identity provider itself. Callers either
//! hand over a fixed token or inject a [`TokenRefresher`] that knows how to
//! mint a new one; [`TokenManager`] decides when to call it.

pub mod token_manager;

pub use token_manager::{TokenManager, TokenRefresher};
