//! Response normalization
//!
//! Converts GraphQL payloads into domain entities. Relation fields are
//! decoded shape by shape (see [`relation`]), polymorphic unions are resolved
//! through `__typename`, and anything that does not fit the expected shape
//! becomes an API-class error rather than a partially filled entity.

pub mod records;
pub mod relation;

use berth_domain::{BerthError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use records::{
    deploy_target, deploy_target_config, environment, notification, project,
    project_notifications, tagged_notification, task_definition, variable,
};
pub use relation::relation_id_of;

/// Top-level field `name` of a response `data` object.
///
/// # Errors
/// Returns [`BerthError::Api`] when `data` lacks the field.
pub fn field<'a>(data: &'a Value, name: &str) -> Result<&'a Value> {
    data.get(name).ok_or_else(|| malformed(name, "field missing from response"))
}

/// Like [`field`], treating an explicit `null` as absent.
pub fn non_null<'a>(data: &'a Value, name: &str) -> Result<Option<&'a Value>> {
    field(data, name).map(|value| (!value.is_null()).then_some(value))
}

/// Decode every element of a list field; `null` is an empty list.
pub fn list<T, F>(value: &Value, mut decode_one: F) -> Result<Vec<T>>
where
    F: FnMut(&Value) -> Result<T>,
{
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.iter().map(&mut decode_one).collect(),
        other => Err(malformed("list", format!("expected an array, got {}", type_name(other)))),
    }
}

pub(crate) fn decode<T: DeserializeOwned>(kind: &str, value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|err| malformed(kind, err))
}

pub(crate) fn malformed(kind: &str, detail: impl std::fmt::Display) -> BerthError {
    BerthError::Api(format!("unexpected {kind} payload: {detail}"))
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn relation_shapes_normalize_to_ids() {
        let project_ref = |relation: Value| {
            project(&json!({ "id": 1, "name": "p", "kubernetes": relation }))
                .map(|p| p.deploy_target_id)
        };
        assert_eq!(project_ref(json!({ "id": 5, "name": "x" })), Ok(5));
        assert_eq!(project_ref(json!(5)), Ok(5));
        assert_eq!(project_ref(Value::Null), Ok(0));
    }

    #[test]
    fn missing_root_field_is_api_error() {
        let err = field(&json!({}), "projectByName").unwrap_err();
        assert!(matches!(err, BerthError::Api(message) if message.contains("projectByName")));
    }

    #[test]
    fn null_root_field_is_absent() {
        assert_eq!(non_null(&json!({ "projectByName": null }), "projectByName"), Ok(None));
    }

    #[test]
    fn list_rejects_non_arrays() {
        assert!(list(&json!({ "id": 1 }), |v| Ok(v.clone())).is_err());
        assert_eq!(list(&Value::Null, |v| Ok(v.clone())), Ok(Vec::new()));
    }

    #[test]
    fn wrong_shape_is_api_error_not_partial_entity() {
        let err = project(&json!({ "id": 1 })).unwrap_err();
        assert!(matches!(err, BerthError::Api(message) if message.contains("Project")));
    }
}
