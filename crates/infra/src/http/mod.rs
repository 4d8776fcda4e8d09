//! HTTP transport for the GraphQL endpoint

pub mod client;

pub use client::{HttpTransport, HttpTransportBuilder};
