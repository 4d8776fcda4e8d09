//! Port interfaces for talking to the GraphQL control API

use async_trait::async_trait;
use berth_domain::Result;
use serde::Serialize;
use serde_json::Value;

/// One GraphQL operation as sent on the wire: `{query, variables}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlRequest {
    pub query: String,
    pub variables: Value,
}

impl GraphqlRequest {
    pub fn new(query: impl Into<String>, variables: Value) -> Self {
        Self { query: query.into(), variables }
    }
}

/// A single request/response cycle, without retries.
///
/// Implementations classify failures: transport, serialization and HTTP
/// status failures are `Connection`; unreadable bodies and business errors
/// are `Api`. On success the `data` member of the response is returned.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn send(&self, request: &GraphqlRequest, bearer_token: Option<&str>) -> Result<Value>;
}

/// Executes operations with authentication and retry applied.
#[async_trait]
pub trait GraphqlExecutor: Send + Sync {
    /// Run `query` with `variables` and return the response `data`.
    async fn execute(&self, query: &str, variables: Value) -> Result<Value>;
}
