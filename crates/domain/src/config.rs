//! Client configuration
//!
//! Everything the client needs is supplied at construction time. The struct
//! is serde-friendly so the orchestrator can deserialize it from whatever
//! provider block it owns; durations are expressed in whole seconds.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_BACKOFF_MS, DEFAULT_MAX_RETRIES, DEFAULT_REFRESH_THRESHOLD_SECS,
    DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_TTL_SECS,
};
use crate::types::ApiGeneration;

/// Connection settings for one GraphQL control API endpoint.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "snake_case")]
pub struct ClientConfig {
    /// GraphQL endpoint, e.g. `https://api.example.com/graphql`.
    pub endpoint: String,
    /// Static bearer token. Ignored once a refresh callback is attached.
    pub token: Option<String>,
    pub insecure_skip_tls_verify: bool,
    /// Retries after the first attempt (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    #[serde(with = "duration_millis")]
    pub base_backoff: Duration,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Assumed lifetime of a freshly refreshed token.
    #[serde(with = "duration_secs")]
    pub token_ttl: Duration,
    /// Refresh when the token expires within this window.
    #[serde(with = "duration_secs")]
    pub refresh_threshold: Duration,
    /// Skip the capability probe and use this generation.
    pub generation: Option<ApiGeneration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: None,
            insecure_skip_tls_verify: false,
            max_retries: DEFAULT_MAX_RETRIES,
            base_backoff: Duration::from_millis(DEFAULT_BASE_BACKOFF_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            refresh_threshold: Duration::from_secs(DEFAULT_REFRESH_THRESHOLD_SECS),
            generation: None,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_generation(mut self, generation: ApiGeneration) -> Self {
        self.generation = Some(generation);
        self
    }

    #[must_use]
    pub fn insecure(mut self, skip_verify: bool) -> Self {
        self.insecure_skip_tls_verify = skip_verify;
        self
    }
}

// Tokens must never reach logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .field("max_retries", &self.max_retries)
            .field("base_backoff", &self.base_backoff)
            .field("timeout", &self.timeout)
            .field("token_ttl", &self.token_ttl)
            .field("refresh_threshold", &self.refresh_threshold)
            .field("generation", &self.generation)
            .finish()
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
