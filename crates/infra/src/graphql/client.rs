//! GraphQL execution engine
//!
//! Composes the per-client state: the token manager, the retry policy, the
//! transport, the generation detector and the cancellation signal. Each
//! client owns its own token and generation verdict; building a new client
//! starts both afresh.

use std::sync::Arc;

use async_trait::async_trait;
use berth_common::{RetryPolicy, TokenManager, TokenRefresher};
use berth_core::ports::{GraphqlExecutor, GraphqlRequest, GraphqlTransport};
use berth_core::GenerationDetector;
use berth_domain::{ApiGeneration, BerthError, ClientConfig, Result};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::http::HttpTransport;

/// Client for one GraphQL control API endpoint.
pub struct GraphqlClient {
    transport: Arc<dyn GraphqlTransport>,
    tokens: TokenManager,
    retry: RetryPolicy,
    detector: GenerationDetector,
    cancel: CancellationToken,
}

impl GraphqlClient {
    /// Start building a client from `config`.
    pub fn builder(config: ClientConfig) -> GraphqlClientBuilder {
        GraphqlClientBuilder::new(config)
    }

    /// Client over the HTTP transport with a static token (if any).
    ///
    /// # Errors
    /// Returns a validation or config error for an unusable configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Execute one operation with authentication and retry.
    ///
    /// The bearer token is resolved once per call, before the first attempt;
    /// a failed refresh aborts the call without retrying it.
    ///
    /// # Errors
    /// Connection-class errors after the retry budget is spent, the first
    /// API-class error, or [`BerthError::Cancelled`].
    #[instrument(
        name = "graphql",
        skip_all,
        fields(request_id = %Uuid::new_v4(), operation = operation_name(query))
    )]
    pub async fn execute(&self, query: &str, variables: Value) -> Result<Value> {
        if self.cancel.is_cancelled() {
            return Err(BerthError::Cancelled);
        }

        let token = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(BerthError::Cancelled),
            token = self.tokens.access_token() => token?,
        };

        let request = GraphqlRequest::new(query, variables);
        let operation = operation_name(query);
        let result = self
            .retry
            .execute(operation, &self.cancel, || self.transport.send(&request, token.as_deref()))
            .await;

        if let Err(err) = &result {
            debug!(error = %err, "GraphQL operation failed");
        }
        result
    }

    /// Generation of the remote schema, probing on first use.
    pub async fn generation(&self) -> ApiGeneration {
        self.detector.detect(self).await
    }

    pub async fn is_current_generation(&self) -> bool {
        self.generation().await.is_current()
    }

    /// Signal shared by every in-flight and future call of this client.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

impl std::fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlClient")
            .field("tokens", &self.tokens)
            .field("retry", &self.retry)
            .field("detector", &self.detector)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GraphqlExecutor for GraphqlClient {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value> {
        GraphqlClient::execute(self, query, variables).await
    }
}

/// Builder for [`GraphqlClient`].
pub struct GraphqlClientBuilder {
    config: ClientConfig,
    refresher: Option<Arc<dyn TokenRefresher>>,
    transport: Option<Arc<dyn GraphqlTransport>>,
    cancel: Option<CancellationToken>,
}

impl GraphqlClientBuilder {
    fn new(config: ClientConfig) -> Self {
        Self { config, refresher: None, transport: None, cancel: None }
    }

    /// Refresh the bearer token through `refresher`. The configured static
    /// token, if any, is used until it goes stale.
    #[must_use]
    pub fn token_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Replace the HTTP transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn GraphqlTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use an externally owned cancellation signal.
    #[must_use]
    pub fn cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// # Errors
    /// Returns a validation or config error for an unusable configuration.
    pub fn build(self) -> Result<GraphqlClient> {
        let config = self.config;
        crate::config::validate(&config)?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::from_config(&config)?),
        };

        let tokens = match (self.refresher, config.token.clone()) {
            (Some(refresher), initial) => TokenManager::refreshing(
                initial,
                refresher,
                config.token_ttl,
                config.refresh_threshold,
            ),
            (None, Some(token)) => TokenManager::fixed(token),
            (None, None) => TokenManager::anonymous(),
        };

        let detector = config.generation.map_or_else(GenerationDetector::new, GenerationDetector::pinned);

        debug!(
            endpoint = %config.endpoint,
            max_retries = config.max_retries,
            pinned_generation = ?config.generation,
            "built GraphQL client"
        );

        Ok(GraphqlClient {
            transport,
            tokens,
            retry: RetryPolicy::new(config.max_retries, config.base_backoff),
            detector,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// Operation name of a query document, for logs.
pub(crate) fn operation_name(query: &str) -> &str {
    let mut words = query.split_whitespace();
    while let Some(word) = words.next() {
        if word == "query" || word == "mutation" {
            return words
                .next()
                .and_then(|name| name.split(['(', '{']).next())
                .filter(|name| !name.is_empty())
                .unwrap_or("anonymous");
        }
    }
    "anonymous"
}
