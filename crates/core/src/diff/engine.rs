use serde_json::{Map, Value};
use tracing::debug;

use super::schema::EnumField;
use super::{ChangeKind, DiffResult, DiffSchema};

/// Compare `old` and `new` attribute maps under `schema`.
///
/// Keys present on only one side compare against `null`.
pub fn diff(schema: &DiffSchema, old: &Map<String, Value>, new: &Map<String, Value>) -> DiffResult {
    let mut result = DiffResult::default();

    for field in old.keys().chain(new.keys()) {
        if schema.is_ignored(field) || result.changes.contains_key(field) {
            continue;
        }
        let before = old.get(field).unwrap_or(&Value::Null);
        let after = new.get(field).unwrap_or(&Value::Null);
        if values_equal(schema.enum_field(field), before, after) {
            continue;
        }

        let kind = if schema.is_replace_field(field) {
            ChangeKind::Replace
        } else {
            ChangeKind::Update
        };
        result.changes.insert(field.clone(), kind);
    }

    result.has_changes = !result.changes.is_empty();
    result.delete_before_replace = result.requires_replace();

    if result.has_changes {
        debug!(
            kind = schema.kind,
            changed = result.changes.len(),
            replace = result.delete_before_replace,
            "computed diff"
        );
    }
    result
}

fn values_equal(enum_field: Option<&EnumField>, before: &Value, after: &Value) -> bool {
    match (before, after) {
        (Value::String(a), Value::String(b)) if enum_field.is_some() => {
            let canonical = enum_field.map(|field| field.canonical);
            match canonical.map(|canonical| (canonical(a), canonical(b))) {
                Some((Some(a), Some(b))) => a == b,
                _ => a.eq_ignore_ascii_case(b),
            }
        }
        // Numbers may round-trip as integers on one side and floats on the other.
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => before == after,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::schema::{
        DEPLOY_TARGET_CONFIG, ENVIRONMENT, NOTIFICATION, PROJECT, PROJECT_NOTIFICATION,
        TASK_DEFINITION, VARIABLE,
    };
    use super::*;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn git_url_change_is_an_update() {
        let result = diff(
            &PROJECT,
            &map(json!({ "name": "p", "gitUrl": "a" })),
            &map(json!({ "name": "p", "gitUrl": "b" })),
        );
        assert!(result.has_changes);
        assert_eq!(result.change("gitUrl"), Some(ChangeKind::Update));
        assert!(!result.delete_before_replace);
    }

    #[test]
    fn name_change_is_a_replace() {
        let result =
            diff(&PROJECT, &map(json!({ "name": "p" })), &map(json!({ "name": "q" })));
        assert_eq!(result.change("name"), Some(ChangeKind::Replace));
        assert!(result.delete_before_replace);
        assert_eq!(result.replaces().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn scope_case_difference_is_not_drift() {
        let result = diff(
            &VARIABLE,
            &map(json!({ "name": "A", "scope": "BUILD" })),
            &map(json!({ "name": "A", "scope": "build" })),
        );
        assert!(!result.has_changes);
    }

    #[test]
    fn scope_wire_literal_matches_canonical_spelling() {
        let result = diff(
            &VARIABLE,
            &map(json!({ "name": "A", "scope": "CONTAINER_REGISTRY" })),
            &map(json!({ "name": "A", "scope": "registry" })),
        );
        assert!(!result.has_changes);

        let moved = diff(
            &VARIABLE,
            &map(json!({ "name": "A", "scope": "CONTAINER_REGISTRY" })),
            &map(json!({ "name": "A", "scope": "runtime" })),
        );
        assert_eq!(moved.change("scope"), Some(ChangeKind::Update));
    }

    #[test]
    fn non_enum_fields_are_case_sensitive() {
        let result = diff(
            &VARIABLE,
            &map(json!({ "name": "A", "value": "secret" })),
            &map(json!({ "name": "A", "value": "SECRET" })),
        );
        assert_eq!(result.updates().collect::<Vec<_>>(), vec!["value"]);
    }

    #[test]
    fn absent_key_equals_null() {
        let result = diff(
            &ENVIRONMENT,
            &map(json!({ "name": "main", "deployTitle": null })),
            &map(json!({ "name": "main" })),
        );
        assert!(!result.has_changes);
    }

    #[test]
    fn computed_fields_are_ignored() {
        let result = diff(
            &ENVIRONMENT,
            &map(json!({ "id": 3, "name": "main", "route": "https://a", "routes": ["https://a"] })),
            &map(json!({ "name": "main", "environmentType": "production" })),
        );
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.change("environmentType"), Some(ChangeKind::Update));
    }

    #[test]
    fn moving_variable_between_environments_replaces() {
        let result = diff(
            &VARIABLE,
            &map(json!({ "name": "A", "projectId": 1, "environmentId": 4 })),
            &map(json!({ "name": "A", "projectId": 1, "environmentId": 5 })),
        );
        assert_eq!(result.change("environmentId"), Some(ChangeKind::Replace));
        assert!(result.delete_before_replace);
    }

    #[test]
    fn config_weight_updates_in_place() {
        let result = diff(
            &DEPLOY_TARGET_CONFIG,
            &map(json!({ "projectId": 1, "deployTargetId": 2, "weight": 1 })),
            &map(json!({ "projectId": 1, "deployTargetId": 2, "weight": 10.0 })),
        );
        assert_eq!(result.change("weight"), Some(ChangeKind::Update));
        assert!(!result.delete_before_replace);
    }

    #[test]
    fn integer_and_float_forms_compare_equal() {
        let result = diff(
            &DEPLOY_TARGET_CONFIG,
            &map(json!({ "weight": 10 })),
            &map(json!({ "weight": 10.0 })),
        );
        assert!(!result.has_changes);
    }

    #[test]
    fn task_definition_changes_always_replace() {
        let result = diff(
            &TASK_DEFINITION,
            &map(json!({ "name": "t", "description": "old", "type": "COMMAND" })),
            &map(json!({ "name": "t", "description": "new", "type": "command" })),
        );
        assert_eq!(result.change("description"), Some(ChangeKind::Replace));
        assert!(result.change("type").is_none());
        assert!(result.delete_before_replace);
    }

    #[test]
    fn project_notification_changes_always_replace() {
        let result = diff(
            &PROJECT_NOTIFICATION,
            &map(json!({ "projectName": "p", "notificationType": "slack", "notificationName": "a" })),
            &map(json!({ "projectName": "p", "notificationType": "SLACK", "notificationName": "b" })),
        );
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.change("notificationName"), Some(ChangeKind::Replace));
    }

    #[test]
    fn notification_payload_updates_in_place() {
        let result = diff(
            &NOTIFICATION,
            &map(json!({ "name": "deploys", "channel": "#a" })),
            &map(json!({ "name": "deploys", "channel": "#b" })),
        );
        assert_eq!(result.change("channel"), Some(ChangeKind::Update));
        assert!(!result.delete_before_replace);
    }
}
