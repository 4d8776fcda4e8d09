//! Dual-path request routing
//!
//! Resources whose operations differ between schema generations pick a
//! path per call. The generation verdict chooses the first path; when the
//! current path is rejected with a schema-mismatch error the call falls back
//! to the legacy path exactly once.

use std::future::Future;

use berth_domain::{ApiGeneration, BerthError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Messages the remote emits when an operation references schema elements it
/// does not define.
static SCHEMA_MISMATCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)unknown (field|argument|type)|cannot query field|is not defined by type|field .* is not defined",
    )
    .expect("SCHEMA_MISMATCH should compile - this is a bug")
});

/// Whether `error` signals that the request used operations or arguments the
/// remote schema does not know.
///
/// Only API-class errors qualify; connection failures never trigger a
/// fallback.
pub fn is_schema_mismatch(error: &BerthError) -> bool {
    error.api_message().is_some_and(|message| SCHEMA_MISMATCH.is_match(message))
}

/// Run `current` or `legacy` depending on `generation`.
///
/// A schema-mismatch failure of the current path is swallowed and the legacy
/// path runs instead; its result, success or failure, is final.
///
/// # Errors
/// Whatever the chosen path returns.
pub async fn route<T, C, CF, L, LF>(
    operation: &str,
    generation: ApiGeneration,
    current: C,
    legacy: L,
) -> Result<T>
where
    C: FnOnce() -> CF,
    CF: Future<Output = Result<T>>,
    L: FnOnce() -> LF,
    LF: Future<Output = Result<T>>,
{
    if !generation.is_current() {
        debug!(operation, "using legacy path");
        return legacy().await;
    }

    match current().await {
        Err(error) if is_schema_mismatch(&error) => {
            warn!(operation, error = %error, "current path rejected by schema, falling back to legacy");
            legacy().await
        }
        outcome => outcome,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn recognises_schema_mismatch_messages() {
        for message in [
            "Unknown argument \"environment\" on field \"addOrUpdateEnvVariableByName\"",
            "Cannot query field \"envVariablesByProjectEnvironment\" on type \"Query\"",
            "Unknown type \"EnvVariableByNameInput\"",
            "Field \"project\" is not defined by type \"EnvVariableByNameInput\"",
            "unknown field: environmentName",
        ] {
            assert!(is_schema_mismatch(&BerthError::Api(message.into())), "{message}");
        }
    }

    #[test]
    fn ignores_other_errors() {
        assert!(!is_schema_mismatch(&BerthError::Api("Duplicate entry 'API_KEY'".into())));
        assert!(!is_schema_mismatch(&BerthError::Connection("Unknown argument".into())));
        assert!(!is_schema_mismatch(&BerthError::not_found("Variable", "1:API_KEY")));
    }

    #[tokio::test]
    async fn legacy_generation_skips_current_path() {
        let current_calls = AtomicUsize::new(0);
        let result = route(
            "upsert",
            ApiGeneration::Legacy,
            || async {
                current_calls.fetch_add(1, Ordering::SeqCst);
                Ok("current")
            },
            || async { Ok("legacy") },
        )
        .await;

        assert_eq!(result, Ok("legacy"));
        assert_eq!(current_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn schema_mismatch_falls_back_once() {
        let legacy_calls = AtomicUsize::new(0);
        let result = route(
            "upsert",
            ApiGeneration::Current,
            || async { Err(BerthError::Api("Unknown argument \"environment\"".into())) },
            || async {
                legacy_calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            },
        )
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(legacy_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn legacy_failure_after_fallback_is_final() {
        let result: Result<()> = route(
            "upsert",
            ApiGeneration::Current,
            || async { Err(BerthError::Api("Unknown argument \"environment\"".into())) },
            || async { Err(BerthError::Api("Unknown field \"typeId\"".into())) },
        )
        .await;

        assert_eq!(result, Err(BerthError::Api("Unknown field \"typeId\"".into())));
    }

    #[tokio::test]
    async fn business_errors_do_not_fall_back() {
        let legacy_calls = AtomicUsize::new(0);
        let result: Result<()> = route(
            "upsert",
            ApiGeneration::Current,
            || async { Err(BerthError::Api("Duplicate entry".into())) },
            || async {
                legacy_calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert!(matches!(result, Err(BerthError::Api(_))));
        assert_eq!(legacy_calls.load(Ordering::SeqCst), 0);
    }
}
