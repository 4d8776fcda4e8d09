//! Configuration loader
//!
//! Parses a [`ClientConfig`] from TOML or JSON text. No files, environment
//! variables or CLI flags are read here.
//!
//! ## Example
//! ```toml
//! endpoint = "https://api.example.com/graphql"
//! token = "..."
//! max_retries = 5
//! base_backoff = 500        # milliseconds
//! timeout = 30              # seconds
//! token_ttl = 3600          # seconds
//! refresh_threshold = 300   # seconds
//! generation = "current"    # optional, skips the probe
//! ```

use berth_domain::{BerthError, ClientConfig, Result};
use url::Url;

use crate::errors::InfraError;

/// Parse and validate a TOML document.
///
/// # Errors
/// Returns [`BerthError::Config`] if the document is not valid TOML or has
/// fields of the wrong type, and [`BerthError::Validation`] if the endpoint
/// is unusable.
pub fn from_toml_str(contents: &str) -> Result<ClientConfig> {
    let config: ClientConfig = toml::from_str(contents)
        .map_err(|e| BerthError::Config(format!("Invalid TOML format: {e}")))?;
    validate(&config)?;
    tracing::debug!(endpoint = %config.endpoint, "parsed TOML client configuration");
    Ok(config)
}

/// Parse and validate a JSON document.
///
/// # Errors
/// Same as [`from_toml_str`].
pub fn from_json_str(contents: &str) -> Result<ClientConfig> {
    let config: ClientConfig = serde_json::from_str(contents)
        .map_err(|e| BerthError::Config(format!("Invalid JSON format: {e}")))?;
    validate(&config)?;
    tracing::debug!(endpoint = %config.endpoint, "parsed JSON client configuration");
    Ok(config)
}

/// Check a configuration before any network call.
///
/// # Errors
/// Returns [`BerthError::Validation`] naming the offending field.
pub fn validate(config: &ClientConfig) -> Result<()> {
    endpoint_url(config)?;
    if config.timeout.is_zero() {
        return Err(BerthError::validation("timeout", "must be greater than zero")
            .with_suggestion("30"));
    }
    if config.refresh_threshold >= config.token_ttl && !config.token_ttl.is_zero() {
        return Err(BerthError::validation(
            "refresh_threshold",
            "must be shorter than token_ttl or every call refreshes",
        ));
    }
    Ok(())
}

/// Parsed endpoint URL; only `http` and `https` are accepted.
///
/// # Errors
/// Returns [`BerthError::Validation`] on field `endpoint`.
pub fn endpoint_url(config: &ClientConfig) -> Result<Url> {
    let raw = config.endpoint.trim();
    if raw.is_empty() {
        return Err(BerthError::validation("endpoint", "must not be empty")
            .with_suggestion("https://api.example.com/graphql"));
    }

    let url = Url::parse(raw).map_err(|err| BerthError::from(InfraError::from(err)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(BerthError::validation(
            "endpoint",
            format!("unsupported scheme '{other}'"),
        )
        .with_suggestion(format!("https://{}", url.host_str().unwrap_or("api.example.com")))),
    }
}
