//! GraphQL client: token, retry, transport and generation detection wired
//! together per endpoint.

pub mod client;

pub use client::{GraphqlClient, GraphqlClientBuilder};
