//! Runtime detection of the remote schema generation
//!
//! One capability probe per client decides between the legacy and current
//! schema. The verdict lives in the detector owned by that client and is
//! never persisted; a new client probes again.

use berth_domain::ApiGeneration;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::ports::GraphqlExecutor;

/// Input type that only the current schema defines.
pub const PROBE_TYPE_NAME: &str = "EnvVariableByNameInput";

/// Introspection probe; legacy servers answer `__type: null`.
pub const PROBE_QUERY: &str = r"
    query ProbeApiGeneration($name: String!) {
        __type(name: $name) {
            name
        }
    }
";

/// Memoizing generation detector.
#[derive(Debug, Default)]
pub struct GenerationDetector {
    verdict: RwLock<Option<ApiGeneration>>,
}

impl GenerationDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A detector that never probes.
    pub fn pinned(generation: ApiGeneration) -> Self {
        Self { verdict: RwLock::new(Some(generation)) }
    }

    /// Cached verdict, if the probe already ran.
    pub async fn cached(&self) -> Option<ApiGeneration> {
        *self.verdict.read().await
    }

    /// Detect the generation, probing at most once per detector.
    ///
    /// Any probe failure or an unresolved probe result means legacy.
    pub async fn detect(&self, executor: &dyn GraphqlExecutor) -> ApiGeneration {
        if let Some(generation) = *self.verdict.read().await {
            return generation;
        }

        let mut verdict = self.verdict.write().await;
        if let Some(generation) = *verdict {
            return generation;
        }

        let generation =
            match executor.execute(PROBE_QUERY, json!({ "name": PROBE_TYPE_NAME })).await {
                Ok(data) if probe_resolved(&data) => ApiGeneration::Current,
                Ok(_) => ApiGeneration::Legacy,
                Err(err) => {
                    debug!(error = %err, "generation probe failed, assuming legacy schema");
                    ApiGeneration::Legacy
                }
            };

        info!(generation = %generation, "detected API generation");
        *verdict = Some(generation);
        generation
    }

    pub async fn is_current_generation(&self, executor: &dyn GraphqlExecutor) -> bool {
        self.detect(executor).await.is_current()
    }
}

fn probe_resolved(data: &Value) -> bool {
    data.get("__type").and_then(|t| t.get("name")).and_then(Value::as_str).is_some()
}
