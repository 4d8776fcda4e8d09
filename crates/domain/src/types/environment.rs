//! Environment types

use serde::{Deserialize, Serialize};

use crate::errors::{BerthError, Result};
use crate::impl_wire_enum;

/// How an environment is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeployType {
    #[default]
    Branch,
    PullRequest,
}

impl_wire_enum!(DeployType {
    Branch => "branch" / "BRANCH",
    PullRequest => "pullrequest" / "PULLREQUEST",
});

/// Role an environment plays within its project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnvironmentType {
    Production,
    #[default]
    Development,
    Standby,
}

impl_wire_enum!(EnvironmentType {
    Production => "production" / "PRODUCTION",
    Development => "development" / "DEVELOPMENT",
    Standby => "standby" / "STANDBY",
});

/// One deployed instance of a project (a branch or pull request).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: Option<i64>,
    /// Immutable within the owning project.
    pub name: String,
    /// Owning project; immutable.
    pub project_id: i64,
    pub deploy_type: DeployType,
    pub environment_type: EnvironmentType,
    pub deploy_base_ref: Option<String>,
    pub deploy_head_ref: Option<String>,
    pub deploy_title: Option<String>,
    pub auto_idle: Option<bool>,
    /// Primary route, computed by the platform.
    pub route: Option<String>,
    /// All routes, computed by the platform.
    #[serde(default)]
    pub routes: Vec<String>,
}

impl Environment {
    /// # Errors
    /// Returns [`BerthError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BerthError::validation("name", "must not be empty"));
        }
        if self.project_id <= 0 {
            return Err(BerthError::validation(
                "projectId",
                format!("must be a positive id, got {}", self.project_id),
            ));
        }
        if self.deploy_type == DeployType::PullRequest && self.deploy_head_ref.is_none() {
            return Err(BerthError::validation(
                "deployHeadRef",
                "pull request environments need a head ref",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_parsing_is_case_insensitive() {
        assert_eq!("PULLREQUEST".parse::<DeployType>(), Ok(DeployType::PullRequest));
        assert_eq!("Production".parse::<EnvironmentType>(), Ok(EnvironmentType::Production));
        assert!("qa".parse::<EnvironmentType>().is_err());
    }

    #[test]
    fn pull_request_requires_head_ref() {
        let env = Environment {
            name: "pr-12".into(),
            project_id: 3,
            deploy_type: DeployType::PullRequest,
            ..Default::default()
        };
        assert!(matches!(env.validate(), Err(BerthError::Validation { field, .. }) if field == "deployHeadRef"));

        let env = Environment { deploy_head_ref: Some("abc123".into()), ..env };
        assert!(env.validate().is_ok());
    }

    #[test]
    fn deserializes_from_plain_map() {
        let env: Environment = serde_json::from_value(serde_json::json!({
            "name": "main",
            "projectId": 7,
            "deployType": "BRANCH",
            "environmentType": "production"
        }))
        .unwrap();
        assert_eq!(env.deploy_type, DeployType::Branch);
        assert_eq!(env.environment_type, EnvironmentType::Production);
        assert!(env.routes.is_empty());
    }
}
