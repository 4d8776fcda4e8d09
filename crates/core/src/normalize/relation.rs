//! Relation and flag decoding
//!
//! A relation field arrives in one of three shapes depending on the schema
//! generation and the query: a nested object carrying `id`, a bare scalar id
//! (number or numeric string), or null/absent. The shapes are tried in that
//! order and each field is decoded on its own.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Number(i64),
    Text(String),
}

impl IdValue {
    fn into_id<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            Self::Number(id) => Ok(id),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("relation id '{text}' is not numeric"))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelationShape {
    Object { id: Option<IdValue> },
    Scalar(IdValue),
}

/// Deserialize a relation field into its numeric id; null means `0`.
///
/// Use with `#[serde(default, deserialize_with = "relation_id")]`.
pub fn relation_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RelationShape>::deserialize(deserializer)? {
        Some(RelationShape::Object { id: Some(id) } | RelationShape::Scalar(id)) => id.into_id(),
        Some(RelationShape::Object { id: None }) | None => Ok(0),
    }
}

/// Like [`relation_id`], mapping "no relation" to `None`.
pub fn optional_relation_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    relation_id(deserializer).map(|id| (id != 0).then_some(id))
}

/// Relation id of a standalone value.
pub fn relation_id_of(value: &Value) -> Option<i64> {
    relation_id(value).ok()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlagShape {
    Bool(bool),
    Number(i64),
    Text(String),
}

/// Deserialize a flag that older schemas report as `0`/`1`.
pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<FlagShape>::deserialize(deserializer)? {
        None => None,
        Some(FlagShape::Bool(value)) => Some(value),
        Some(FlagShape::Number(value)) => Some(value != 0),
        Some(FlagShape::Text(value)) => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" | "" => Some(false),
            other => {
                return Err(serde::de::Error::custom(format!("'{other}' is not a flag value")))
            }
        },
    })
}

/// Deserialize a number that may arrive as a string.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IdValue>::deserialize(deserializer)? {
        Some(value) => value.into_id(),
        None => Ok(0),
    }
}
