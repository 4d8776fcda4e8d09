//! Cluster registrations and project-to-cluster routing

use serde::{Deserialize, Serialize};

use crate::errors::{BerthError, Result};

/// A registered cluster that environments can be deployed to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeployTarget {
    pub id: Option<i64>,
    /// Immutable once created.
    pub name: String,
    /// API endpoint of the cluster.
    pub console_url: String,
    /// Cluster credential. Write-only; never returned by reads.
    pub token: Option<String>,
    pub cloud_provider: Option<String>,
    pub cloud_region: Option<String>,
    pub ssh_host: Option<String>,
    pub ssh_port: Option<String>,
    pub build_image: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    pub router_pattern: Option<String>,
}

impl DeployTarget {
    /// # Errors
    /// Returns [`BerthError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BerthError::validation("name", "must not be empty"));
        }
        let url = self.console_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(BerthError::validation(
                "consoleUrl",
                format!("'{}' is not an http(s) URL", self.console_url),
            )
            .with_suggestion(format!("https://{url}")));
        }
        Ok(())
    }
}

impl std::fmt::Debug for DeployTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployTarget")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("console_url", &self.console_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("cloud_provider", &self.cloud_provider)
            .field("cloud_region", &self.cloud_region)
            .field("ssh_host", &self.ssh_host)
            .field("ssh_port", &self.ssh_port)
            .field("build_image", &self.build_image)
            .field("disabled", &self.disabled)
            .field("router_pattern", &self.router_pattern)
            .finish()
    }
}

/// Mutable deploy target fields. `None` leaves the remote value untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeployTargetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_pattern: Option<String>,
}

/// Routes one project's branches and pull requests to one deploy target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeployTargetConfig {
    pub id: Option<i64>,
    /// Immutable.
    pub project_id: i64,
    /// Immutable.
    pub deploy_target_id: i64,
    pub branches: Option<String>,
    pub pullrequests: Option<String>,
    /// Higher weight wins when several configs match.
    #[serde(default)]
    pub weight: i64,
    pub deploy_target_project_pattern: Option<String>,
}

impl DeployTargetConfig {
    /// # Errors
    /// Returns [`BerthError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.project_id <= 0 {
            return Err(BerthError::validation("projectId", "must be a positive id"));
        }
        if self.deploy_target_id <= 0 {
            return Err(BerthError::validation("deployTargetId", "must be a positive id"));
        }
        if self.weight < 0 {
            return Err(BerthError::validation(
                "weight",
                format!("must be non-negative, got {}", self.weight),
            )
            .with_suggestion("0"));
        }
        Ok(())
    }
}

/// Mutable deploy target config fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeployTargetConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pullrequests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_target_project_pattern: Option<String>,
}
