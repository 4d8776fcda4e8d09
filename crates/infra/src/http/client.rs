use std::time::Duration;

use async_trait::async_trait;
use berth_core::ports::{GraphqlRequest, GraphqlTransport};
use berth_domain::constants::DEFAULT_TIMEOUT_SECS;
use berth_domain::{BerthError, ClientConfig, Result};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::errors::InfraError;

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphqlErrorMessage>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorMessage {
    message: String,
}

/// One POST per call against a single GraphQL endpoint. Retries are layered
/// on top by the GraphQL client.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: ReqwestClient,
    endpoint: Url,
}

impl HttpTransport {
    /// Start building a transport for `endpoint`.
    pub fn builder(endpoint: Url) -> HttpTransportBuilder {
        HttpTransportBuilder::new(endpoint)
    }

    /// Transport configured from a [`ClientConfig`].
    ///
    /// # Errors
    /// Returns [`BerthError::Validation`] for an unusable endpoint and
    /// [`BerthError::Config`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let endpoint = crate::config::endpoint_url(config)?;
        Self::builder(endpoint)
            .timeout(config.timeout)
            .accept_invalid_certs(config.insecure_skip_tls_verify)
            .build()
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn classify(status: reqwest::StatusCode, body: &[u8]) -> Result<Value> {
        if status.as_u16() >= 400 {
            return Err(BerthError::Connection(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            )));
        }

        let response: GraphqlResponse =
            serde_json::from_slice(body).map_err(|err| BerthError::from(InfraError::from(err)))?;

        let errors = response.errors.unwrap_or_default();
        if !errors.is_empty() {
            let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
            return Err(BerthError::Api(messages.join(", ")));
        }

        Ok(response.data.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
    async fn send(&self, request: &GraphqlRequest, bearer_token: Option<&str>) -> Result<Value> {
        let mut builder = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(request);

        if let Some(token) = bearer_token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = builder.send().await.map_err(|err| BerthError::from(InfraError::from(err)))?;
        let status = response.status();
        debug!(%status, endpoint = %self.endpoint, "received GraphQL response");

        // A body cut short is a network failure; only bytes that arrive but
        // fail to parse are API-class.
        let body = response
            .bytes()
            .await
            .map_err(|err| BerthError::Connection(format!("failed to read response body: {err}")))?;
        Self::classify(status, &body)
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    endpoint: Url,
    timeout: Duration,
    user_agent: Option<String>,
    accept_invalid_certs: bool,
}

impl HttpTransportBuilder {
    fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
            accept_invalid_certs: false,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Skip TLS certificate verification (self-signed development endpoints).
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    pub fn build(self) -> Result<HttpTransport> {
        let agent = self
            .user_agent
            .unwrap_or_else(|| concat!("berth/", env!("CARGO_PKG_VERSION")).to_owned());
        let mut builder = ReqwestClient::builder().timeout(self.timeout).user_agent(agent).no_proxy();

        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|err| BerthError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(HttpTransport { client, endpoint: self.endpoint })
    }
}
