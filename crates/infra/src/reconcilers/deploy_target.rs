//! Deploy target reconciler
//!
//! The remote has no by-id query for deploy targets; reads list every target
//! and filter locally.

use std::sync::Arc;

use berth_core::diff::schema::DEPLOY_TARGET;
use berth_core::diff::DiffSchema;
use berth_core::normalize;
use berth_domain::{BerthError, DeleteOutcome, DeployTarget, DeployTargetPatch, Result};
use serde_json::json;
use tracing::{info, instrument};

use super::{compact, delete_outcome, Diffable};
use crate::graphql::GraphqlClient;

macro_rules! deploy_target_fields {
    () => {
        "id name consoleUrl cloudProvider cloudRegion sshHost sshPort buildImage disabled routerPattern"
    };
}

const ADD_KUBERNETES: &str = concat!(
    "mutation AddKubernetes($input: AddKubernetesInput!) { addKubernetes(input: $input) { ",
    deploy_target_fields!(),
    " } }"
);

const UPDATE_KUBERNETES: &str = concat!(
    "mutation UpdateKubernetes($input: UpdateKubernetesInput!) { updateKubernetes(input: $input) { ",
    deploy_target_fields!(),
    " } }"
);

const DELETE_KUBERNETES: &str =
    "mutation DeleteKubernetes($input: DeleteKubernetesInput!) { deleteKubernetes(input: $input) }";

const ALL_KUBERNETES: &str =
    concat!("query AllKubernetes { allKubernetes { ", deploy_target_fields!(), " } }");

#[derive(Debug, Clone)]
pub struct DeployTargetReconciler {
    client: Arc<GraphqlClient>,
}

impl DeployTargetReconciler {
    pub fn new(client: Arc<GraphqlClient>) -> Self {
        Self { client }
    }

    /// Register a cluster. The token is sent once and never read back.
    #[instrument(skip(self, target), fields(name = %target.name))]
    pub async fn create(&self, target: &DeployTarget) -> Result<DeployTarget> {
        target.validate()?;
        let input = compact(json!({
            "name": target.name,
            "consoleUrl": target.console_url,
            "token": target.token,
            "cloudProvider": target.cloud_provider,
            "cloudRegion": target.cloud_region,
            "sshHost": target.ssh_host,
            "sshPort": target.ssh_port,
            "buildImage": target.build_image,
            "disabled": target.disabled,
            "routerPattern": target.router_pattern,
        }));

        let data = self.client.execute(ADD_KUBERNETES, json!({ "input": input })).await?;
        let created = normalize::deploy_target(normalize::field(&data, "addKubernetes")?)?;
        info!(id = ?created.id, "registered deploy target");
        Ok(created)
    }

    /// # Errors
    /// `NotFound { kind: "DeployTarget", key: id }` if no registered target
    /// has that id.
    #[instrument(skip(self))]
    pub async fn read(&self, id: i64) -> Result<DeployTarget> {
        self.list()
            .await?
            .into_iter()
            .find(|target| target.id == Some(id))
            .ok_or_else(|| BerthError::not_found("DeployTarget", id))
    }

    #[instrument(skip(self))]
    pub async fn read_by_name(&self, name: &str) -> Result<DeployTarget> {
        self.list()
            .await?
            .into_iter()
            .find(|target| target.name == name)
            .ok_or_else(|| BerthError::not_found("DeployTarget", name))
    }

    pub async fn list(&self) -> Result<Vec<DeployTarget>> {
        let data = self.client.execute(ALL_KUBERNETES, json!({})).await?;
        normalize::list(normalize::field(&data, "allKubernetes")?, normalize::deploy_target)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i64, patch: &DeployTargetPatch) -> Result<DeployTarget> {
        if *patch == DeployTargetPatch::default() {
            return self.read(id).await;
        }
        let patch = serde_json::to_value(patch)
            .map_err(|err| BerthError::validation("patch", err.to_string()))?;
        let input = json!({ "id": id, "patch": patch });
        let data = self.client.execute(UPDATE_KUBERNETES, json!({ "input": input })).await?;
        normalize::deploy_target(normalize::field(&data, "updateKubernetes")?)
    }

    /// Deletion is keyed by name, so the target is read first.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<DeleteOutcome> {
        let target = match self.read(id).await {
            Ok(target) => target,
            Err(err) => return delete_outcome("DeployTarget", &id.to_string(), Err::<(), _>(err)),
        };
        let result = self
            .client
            .execute(DELETE_KUBERNETES, json!({ "input": { "name": target.name } }))
            .await;
        delete_outcome("DeployTarget", &id.to_string(), result)
    }
}

impl Diffable for DeployTargetReconciler {
    type Entity = DeployTarget;

    const SCHEMA: DiffSchema = DEPLOY_TARGET;
}
