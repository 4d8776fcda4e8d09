//! Project types

use serde::{Deserialize, Serialize};

use crate::errors::{BerthError, Result};

/// A deployable application, owner of environments and project-scoped
/// variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Option<i64>,
    /// Unique across the platform; immutable once created.
    pub name: String,
    pub git_url: String,
    /// Target cluster reference.
    pub deploy_target_id: i64,
    pub production_environment: String,
    pub branches: Option<String>,
    pub pullrequests: Option<String>,
    pub auto_idle: Option<bool>,
    pub storage_calc: Option<bool>,
    pub created: Option<String>,
}

/// Mutable project fields. `None` leaves the remote value untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pullrequests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_idle: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_calc: Option<bool>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Project {
    /// Local checks run before the create mutation is sent.
    ///
    /// # Errors
    /// Returns [`BerthError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        validate_resource_name("name", &self.name)?;
        if self.git_url.trim().is_empty() {
            return Err(BerthError::validation("gitUrl", "must not be empty"));
        }
        if self.production_environment.trim().is_empty() {
            return Err(BerthError::validation("productionEnvironment", "must not be empty"));
        }
        if self.deploy_target_id <= 0 {
            return Err(BerthError::validation(
                "deployTargetId",
                format!("must be a positive id, got {}", self.deploy_target_id),
            ));
        }
        Ok(())
    }
}

/// Project and environment names are lower-case DNS-style labels.
///
/// # Errors
/// Returns [`BerthError::Validation`] with a normalized suggestion when the
/// name only differs by case or separators.
pub fn validate_resource_name(field: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BerthError::validation(field, "must not be empty"));
    }
    let valid = name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        return Ok(());
    }
    let suggestion: String = name
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    Err(BerthError::validation(
        field,
        format!("'{name}' may only contain lower-case letters, digits and '-'"),
    )
    .with_suggestion(suggestion))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project {
            name: "shop-frontend".into(),
            git_url: "git@example.com:acme/shop.git".into(),
            deploy_target_id: 1,
            production_environment: "main".into(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_project_passes() {
        assert!(project().validate().is_ok());
    }

    #[test]
    fn upper_case_name_is_rejected_with_suggestion() {
        let p = Project { name: "Shop_Frontend".into(), ..project() };
        match p.validate() {
            Err(BerthError::Validation { field, suggestion, .. }) => {
                assert_eq!(field, "name");
                assert_eq!(suggestion.as_deref(), Some("shop-frontend"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_deploy_target_is_rejected() {
        let p = Project { deploy_target_id: 0, ..project() };
        assert!(matches!(p.validate(), Err(BerthError::Validation { field, .. }) if field == "deployTargetId"));
    }

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let patch = ProjectPatch::default();
        assert!(patch.is_empty());
        assert_eq!(serde_json::to_value(&patch).unwrap(), serde_json::json!({}));
    }
}
