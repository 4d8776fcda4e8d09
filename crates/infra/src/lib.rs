//! # Berth Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest-based GraphQL transport
//! - The GraphQL client (token lifecycle, retry, generation detection)
//! - One reconciler per resource kind
//! - Configuration parsing
//!
//! ## Architecture
//! - Implements traits defined in `berth-core`
//! - Depends on `berth-common`, `berth-core` and `berth-domain`
//! - Contains all "impure" code (network I/O)

pub mod config;
pub mod errors;
pub mod graphql;
pub mod http;
pub mod reconcilers;

// Re-export commonly used items
pub use errors::InfraError;
pub use graphql::{GraphqlClient, GraphqlClientBuilder};
pub use http::{HttpTransport, HttpTransportBuilder};
pub use reconcilers::*;
