//! Replace-vs-update classification
//!
//! A diff compares the previously applied attributes of one resource with the
//! desired ones, both as plain key/value maps. Every changed field is either
//! applied in place ([`ChangeKind::Update`]) or forces the resource to be
//! recreated ([`ChangeKind::Replace`]). Identity fields participate in remote
//! uniqueness constraints, so any replacement also requires deleting the old
//! resource before creating the new one.

mod engine;
pub mod schema;

use std::collections::BTreeMap;

use serde::Serialize;

pub use engine::diff;
pub use schema::DiffSchema;

/// How a changed field is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Update,
    Replace,
}

/// Outcome of comparing two attribute maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    pub has_changes: bool,
    pub changes: BTreeMap<String, ChangeKind>,
    pub delete_before_replace: bool,
}

impl DiffResult {
    /// Fields forcing a replacement.
    pub fn replaces(&self) -> impl Iterator<Item = &str> {
        self.fields_of(ChangeKind::Replace)
    }

    /// Fields applied in place.
    pub fn updates(&self) -> impl Iterator<Item = &str> {
        self.fields_of(ChangeKind::Update)
    }

    pub fn requires_replace(&self) -> bool {
        self.changes.values().any(|kind| *kind == ChangeKind::Replace)
    }

    pub fn change(&self, field: &str) -> Option<ChangeKind> {
        self.changes.get(field).copied()
    }

    fn fields_of(&self, kind: ChangeKind) -> impl Iterator<Item = &str> {
        self.changes.iter().filter(move |(_, k)| **k == kind).map(|(field, _)| field.as_str())
    }
}
