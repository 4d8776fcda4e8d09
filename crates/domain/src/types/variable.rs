//! Configuration variable types

use serde::{Deserialize, Serialize};

use crate::errors::{BerthError, Result};
use crate::impl_wire_enum;

/// Where a variable is made available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VariableScope {
    Build,
    Runtime,
    #[default]
    Global,
    Registry,
}

impl_wire_enum!(VariableScope {
    Build => "build" / "BUILD",
    Runtime => "runtime" / "RUNTIME",
    Global => "global" / "GLOBAL",
    Registry => "registry" / "CONTAINER_REGISTRY",
});

impl VariableScope {
    /// Parse a user-supplied scope, naming the closest valid scope when the
    /// value is unknown.
    ///
    /// # Errors
    /// Returns [`BerthError::Validation`] for `field = "scope"`.
    pub fn parse_input(raw: &str) -> Result<Self> {
        raw.parse().map_err(|_| {
            BerthError::validation("scope", format!("unknown scope '{raw}'"))
                .with_suggestion(Self::closest(raw).as_str())
        })
    }

    fn closest(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .min_by_key(|scope| edit_distance(&lowered, scope.as_str()))
            .unwrap_or_default()
    }
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            let insertion = current[j] + 1;
            let deletion = previous[j + 1] + 1;
            current.push(substitution.min(insertion).min(deletion));
        }
        previous = current;
    }
    previous[b.len()]
}

/// A name/value pair owned by a project, or by one environment of it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: Option<i64>,
    pub name: String,
    pub value: String,
    pub scope: VariableScope,
    /// Owning project; immutable.
    pub project_id: i64,
    /// Owning environment; `None` for project-scoped variables. Immutable
    /// once set.
    pub environment_id: Option<i64>,
}

impl Variable {
    /// # Errors
    /// Returns [`BerthError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BerthError::validation("name", "must not be empty"));
        }
        if self.name.contains(char::is_whitespace) {
            return Err(BerthError::validation("name", "must not contain whitespace")
                .with_suggestion(self.name.split_whitespace().collect::<Vec<_>>().join("_")));
        }
        if self.project_id <= 0 {
            return Err(BerthError::validation(
                "projectId",
                format!("must be a positive id, got {}", self.project_id),
            ));
        }
        if matches!(self.environment_id, Some(id) if id <= 0) {
            return Err(BerthError::validation("environmentId", "must be a positive id"));
        }
        Ok(())
    }

    pub const fn is_environment_scoped(&self) -> bool {
        self.environment_id.is_some()
    }
}

// Values are secrets.
impl std::fmt::Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variable")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("scope", &self.scope)
            .field("project_id", &self.project_id)
            .field("environment_id", &self.environment_id)
            .finish()
    }
}
