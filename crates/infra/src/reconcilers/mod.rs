//! Resource reconcilers
//!
//! One reconciler per resource kind maps create/read/update/delete onto the
//! remote operations of that kind and classifies proposed changes through
//! its diff schema. Variable and task definition operations go through the
//! dual-path router; every other kind has a single path.

pub mod deploy_target;
pub mod deploy_target_config;
pub mod environment;
mod lookup;
pub mod notification;
pub mod project;
pub mod project_notification;
pub mod task_definition;
pub mod variable;

use berth_core::diff::{self, DiffResult, DiffSchema};
use berth_domain::{BerthError, DeleteOutcome, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

pub use deploy_target::DeployTargetReconciler;
pub use deploy_target_config::DeployTargetConfigReconciler;
pub use environment::EnvironmentReconciler;
pub use notification::NotificationReconciler;
pub use project::ProjectReconciler;
pub use project_notification::ProjectNotificationReconciler;
pub use task_definition::TaskDefinitionReconciler;
pub use variable::VariableReconciler;

/// Replace-vs-update classification for one resource kind.
pub trait Diffable {
    type Entity: Serialize;

    const SCHEMA: DiffSchema;

    /// Compare two attribute maps as the orchestrator stores them.
    fn diff(&self, old: &Map<String, Value>, new: &Map<String, Value>) -> DiffResult {
        diff::diff(&Self::SCHEMA, old, new)
    }

    /// Attribute map of an entity, keyed the way the diff schema expects.
    ///
    /// # Errors
    /// Returns [`BerthError::Validation`] if the entity does not serialize
    /// to a map.
    fn attributes(entity: &Self::Entity) -> Result<Map<String, Value>> {
        match serde_json::to_value(entity) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => Err(BerthError::validation(
                Self::SCHEMA.kind,
                "entity does not serialize to an attribute map",
            )),
        }
    }

    /// Compare two entities.
    ///
    /// # Errors
    /// See [`Diffable::attributes`].
    fn diff_entities(&self, old: &Self::Entity, new: &Self::Entity) -> Result<DiffResult> {
        Ok(self.diff(&Self::attributes(old)?, &Self::attributes(new)?))
    }
}

/// Remote messages reporting that the addressed resource does not exist.
static MISSING_RESOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)not found|does not exist|doesn't exist|no \w+ (with|named|found)")
        .expect("MISSING_RESOURCE should compile - this is a bug")
});

fn is_missing(error: &BerthError) -> bool {
    error.is_not_found() || error.api_message().is_some_and(|m| MISSING_RESOURCE.is_match(m))
}

/// Map the result of a delete to its outcome; a resource that is already
/// gone is not an error.
pub(crate) fn delete_outcome<T>(kind: &str, key: &str, result: Result<T>) -> Result<DeleteOutcome> {
    match result {
        Ok(_) => {
            info!(kind, key, "deleted resource");
            Ok(DeleteOutcome::Deleted)
        }
        Err(err) if is_missing(&err) => {
            info!(kind, key, error = %err, "resource already gone");
            Ok(DeleteOutcome::AlreadyGone)
        }
        Err(err) => Err(err),
    }
}

/// Drop `null` members so optional inputs are omitted rather than cleared.
pub(crate) fn compact(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            Value::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect())
        }
        other => other,
    }
}

/// Flags travel as `0`/`1` integers on the wire.
pub(crate) fn flag(value: Option<bool>) -> Value {
    value.map_or(Value::Null, |v| Value::from(i32::from(v)))
}
