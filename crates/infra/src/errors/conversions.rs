//! Conversions from external infrastructure errors into domain errors.

use berth_domain::BerthError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub BerthError);

impl From<InfraError> for BerthError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<BerthError> for InfraError {
    fn from(value: BerthError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoBerthError {
    fn into_berth(self) -> BerthError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → BerthError */
/* -------------------------------------------------------------------------- */

impl IntoBerthError for HttpError {
    fn into_berth(self) -> BerthError {
        if self.is_timeout() {
            return BerthError::Connection("HTTP request timed out".into());
        }

        if self.is_connect() {
            return BerthError::Connection(format!("HTTP connection failure: {self}"));
        }

        if let Some(status) = self.status() {
            return BerthError::Connection(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        // Body and decode failures come from the socket; parsing happens in
        // serde_json.
        BerthError::Connection(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_berth())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → BerthError */
/* -------------------------------------------------------------------------- */

impl IntoBerthError for JsonError {
    fn into_berth(self) -> BerthError {
        BerthError::Api(format!("malformed response body: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_berth())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → BerthError */
/* -------------------------------------------------------------------------- */

impl IntoBerthError for UrlError {
    fn into_berth(self) -> BerthError {
        BerthError::validation("endpoint", format!("invalid endpoint URL: {self}"))
            .with_suggestion("https://api.example.com/graphql")
    }
}

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        InfraError(value.into_berth())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
