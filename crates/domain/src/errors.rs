//! Error types used throughout the reconciliation core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Berth
///
/// Only [`BerthError::Connection`] is transient; every other variant
/// describes an outcome that repeating the same request cannot change.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum BerthError {
    /// Network, transport, serialization or HTTP-status failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The remote answered with a business error or an unreadable body.
    #[error("API error: {0}")]
    Api(String),

    /// A by-key lookup found nothing.
    #[error("{kind} not found: {key}")]
    NotFound { kind: String, key: String },

    /// A local precondition failed before any network call was made.
    #[error("Invalid {field}: {message}{}", suggestion_suffix(.suggestion))]
    Validation { field: String, message: String, suggestion: Option<String> },

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The client was constructed with unusable settings.
    #[error("Configuration error: {0}")]
    Config(String),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    suggestion.as_deref().map(|s| format!(" (suggestion: {s})")).unwrap_or_default()
}

/// Equality-testable sentinel for the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Connection,
    Api,
    NotFound,
    Validation,
    Cancelled,
    Config,
}

impl BerthError {
    /// Sentinel for this error's class.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::Api(_) => ErrorKind::Api,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether repeating the request unchanged could succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Build a [`BerthError::NotFound`] for `kind` searched by `key`.
    pub fn not_found(kind: impl Into<String>, key: impl ToString) -> Self {
        Self::NotFound { kind: kind.into(), key: key.to_string() }
    }

    /// Build a [`BerthError::Validation`] without a suggestion.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into(), suggestion: None }
    }

    /// Attach a suggestion to a validation error; other variants pass through.
    #[must_use]
    pub fn with_suggestion(self, hint: impl Into<String>) -> Self {
        match self {
            Self::Validation { field, message, .. } => {
                Self::Validation { field, message, suggestion: Some(hint.into()) }
            }
            other => other,
        }
    }

    /// Message carried by API-class errors, used for schema-mismatch routing.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Api(message) => Some(message),
            _ => None,
        }
    }
}

/// Result type alias for Berth operations
pub type Result<T> = std::result::Result<T, BerthError>;
