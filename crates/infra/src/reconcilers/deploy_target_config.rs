//! Deploy target config reconciler

use std::sync::Arc;

use berth_core::diff::schema::DEPLOY_TARGET_CONFIG;
use berth_core::diff::DiffSchema;
use berth_core::import_key::DeployTargetConfigKey;
use berth_core::normalize;
use berth_domain::{
    BerthError, DeleteOutcome, DeployTargetConfig, DeployTargetConfigPatch, Result,
};
use serde_json::json;
use tracing::{info, instrument};

use super::{compact, delete_outcome, Diffable};
use crate::graphql::GraphqlClient;

macro_rules! config_fields {
    () => {
        "id branches pullrequests weight deployTargetProjectPattern project { id } deployTarget { id name }"
    };
}

const ADD_CONFIG: &str = concat!(
    "mutation AddDeployTargetConfig($input: AddDeployTargetConfigInput!) { addDeployTargetConfig(input: $input) { ",
    config_fields!(),
    " } }"
);

const UPDATE_CONFIG: &str = concat!(
    "mutation UpdateDeployTargetConfig($input: UpdateDeployTargetConfigInput!) { updateDeployTargetConfig(input: $input) { ",
    config_fields!(),
    " } }"
);

const DELETE_CONFIG: &str = "mutation DeleteDeployTargetConfig($input: DeleteDeployTargetConfigInput!) { deleteDeployTargetConfig(input: $input) }";

const CONFIGS_BY_PROJECT: &str = concat!(
    "query DeployTargetConfigsByProjectId($project: Int!) { deployTargetConfigsByProjectId(project: $project) { ",
    config_fields!(),
    " } }"
);

/// Routing rules from one project to one deploy target.
#[derive(Debug, Clone)]
pub struct DeployTargetConfigReconciler {
    client: Arc<GraphqlClient>,
}

impl DeployTargetConfigReconciler {
    pub fn new(client: Arc<GraphqlClient>) -> Self {
        Self { client }
    }

    #[instrument(skip(self, config), fields(project_id = config.project_id, deploy_target_id = config.deploy_target_id))]
    pub async fn create(&self, config: &DeployTargetConfig) -> Result<DeployTargetConfig> {
        config.validate()?;
        let input = compact(json!({
            "project": config.project_id,
            "deployTarget": config.deploy_target_id,
            "branches": config.branches,
            "pullrequests": config.pullrequests,
            "weight": config.weight,
            "deployTargetProjectPattern": config.deploy_target_project_pattern,
        }));

        let data = self.client.execute(ADD_CONFIG, json!({ "input": input })).await?;
        let created = normalize::deploy_target_config(
            normalize::field(&data, "addDeployTargetConfig")?,
            config.project_id,
        )?;
        info!(id = ?created.id, "created deploy target config");
        Ok(created)
    }

    /// # Errors
    /// [`BerthError::NotFound`] if the project has no config with that id.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn read(&self, key: &DeployTargetConfigKey) -> Result<DeployTargetConfig> {
        self.list_for_project(key.project_id)
            .await?
            .into_iter()
            .find(|config| config.id == Some(key.config_id))
            .ok_or_else(|| BerthError::not_found("DeployTargetConfig", key))
    }

    pub async fn list_for_project(&self, project_id: i64) -> Result<Vec<DeployTargetConfig>> {
        let data =
            self.client.execute(CONFIGS_BY_PROJECT, json!({ "project": project_id })).await?;
        normalize::list(normalize::field(&data, "deployTargetConfigsByProjectId")?, |value| {
            normalize::deploy_target_config(value, project_id)
        })
    }

    #[instrument(skip(self, key, patch), fields(key = %key))]
    pub async fn update(
        &self,
        key: &DeployTargetConfigKey,
        patch: &DeployTargetConfigPatch,
    ) -> Result<DeployTargetConfig> {
        if matches!(patch.weight, Some(weight) if weight < 0) {
            return Err(BerthError::validation("weight", "must be non-negative")
                .with_suggestion("0"));
        }
        if *patch == DeployTargetConfigPatch::default() {
            return self.read(key).await;
        }

        let patch = serde_json::to_value(patch)
            .map_err(|err| BerthError::validation("patch", err.to_string()))?;
        let input = json!({ "id": key.config_id, "patch": patch });
        let data = self.client.execute(UPDATE_CONFIG, json!({ "input": input })).await?;
        normalize::deploy_target_config(
            normalize::field(&data, "updateDeployTargetConfig")?,
            key.project_id,
        )
    }

    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn delete(&self, key: &DeployTargetConfigKey) -> Result<DeleteOutcome> {
        let input = json!({ "id": key.config_id, "project": key.project_id });
        let result = self.client.execute(DELETE_CONFIG, json!({ "input": input })).await;
        delete_outcome("DeployTargetConfig", &key.to_string(), result)
    }
}

impl Diffable for DeployTargetConfigReconciler {
    type Entity = DeployTargetConfig;

    const SCHEMA: DiffSchema = DEPLOY_TARGET_CONFIG;
}
