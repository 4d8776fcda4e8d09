//! # Berth Domain
//!
//! Business domain types for the Berth reconciliation core.
//!
//! This crate contains:
//! - Resource entities (projects, environments, variables, deploy targets,
//!   task definitions, notifications)
//! - The error taxonomy and `Result` alias
//! - Client configuration
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Berth crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
