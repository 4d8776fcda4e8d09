//! # Berth Core
//!
//! Pure reconciliation logic - no HTTP or runtime wiring.
//!
//! This crate contains:
//! - Port interfaces for the GraphQL transport and executor
//! - API generation detection and dual-path routing
//! - Response normalization into domain entities
//! - Replace-vs-update diff classification
//! - Composite import key parsing
//!
//! ## Architecture Principles
//! - Only depends on `berth-domain`
//! - All network access goes through the traits in [`ports`]
//! - Pure, testable business logic

pub mod diff;
pub mod generation;
pub mod import_key;
pub mod normalize;
pub mod ports;
pub mod routing;

pub use diff::{ChangeKind, DiffResult, DiffSchema};
pub use generation::GenerationDetector;
pub use ports::{GraphqlExecutor, GraphqlRequest, GraphqlTransport};
pub use routing::{is_schema_mismatch, route};
