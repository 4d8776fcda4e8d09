//! Client configuration parsing and validation
//!
//! The orchestrator owns where configuration comes from; this module only
//! turns an in-memory document into a validated [`berth_domain::ClientConfig`].

pub mod loader;

// Re-export commonly used items
pub use loader::{endpoint_url, from_json_str, from_toml_str, validate};
