//! Environment reconciler
//!
//! The remote exposes a single upsert for environments, so create and update
//! send the same mutation. Deletion is keyed by names and needs the owning
//! project's name looked up first.

use std::sync::Arc;

use berth_core::diff::schema::ENVIRONMENT;
use berth_core::diff::DiffSchema;
use berth_core::import_key::EnvironmentKey;
use berth_core::normalize;
use berth_domain::{BerthError, DeleteOutcome, Environment, Result};
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{compact, delete_outcome, flag, lookup, Diffable};
use crate::graphql::GraphqlClient;

macro_rules! environment_fields {
    () => {
        "id name deployType environmentType deployBaseRef deployHeadRef deployTitle autoIdle route routes project { id name }"
    };
}

const UPSERT_ENVIRONMENT: &str = concat!(
    "mutation AddOrUpdateEnvironment($input: AddEnvironmentInput!) { addOrUpdateEnvironment(input: $input) { ",
    environment_fields!(),
    " } }"
);

const ENVIRONMENT_BY_NAME: &str = concat!(
    "query EnvironmentByName($name: String!, $project: Int!) { environmentByName(name: $name, project: $project) { ",
    environment_fields!(),
    " } }"
);

const ENVIRONMENT_BY_ID: &str = concat!(
    "query EnvironmentById($id: Int!) { environmentById(id: $id) { ",
    environment_fields!(),
    " } }"
);

const DELETE_ENVIRONMENT: &str =
    "mutation DeleteEnvironment($input: DeleteEnvironmentInput!) { deleteEnvironment(input: $input) }";

#[derive(Debug, Clone)]
pub struct EnvironmentReconciler {
    client: Arc<GraphqlClient>,
}

impl EnvironmentReconciler {
    pub fn new(client: Arc<GraphqlClient>) -> Self {
        Self { client }
    }

    /// Create `environment`, or update it if the project already has one
    /// with the same name.
    ///
    /// # Errors
    /// Validation errors before any call, otherwise the client's errors.
    #[instrument(skip(self, environment), fields(name = %environment.name, project_id = environment.project_id))]
    pub async fn create(&self, environment: &Environment) -> Result<Environment> {
        environment.validate()?;
        let input = compact(json!({
            "name": environment.name,
            "project": environment.project_id,
            "deployType": environment.deploy_type.as_wire(),
            "environmentType": environment.environment_type.as_wire(),
            "deployBaseRef": environment.deploy_base_ref,
            "deployHeadRef": environment.deploy_head_ref,
            "deployTitle": environment.deploy_title,
            "autoIdle": flag(environment.auto_idle),
        }));

        let data = self.client.execute(UPSERT_ENVIRONMENT, json!({ "input": input })).await?;
        let saved = normalize::environment(
            normalize::field(&data, "addOrUpdateEnvironment")?,
            environment.project_id,
        )?;
        info!(id = ?saved.id, "saved environment");
        Ok(saved)
    }

    /// Same upsert as [`EnvironmentReconciler::create`].
    pub async fn update(&self, environment: &Environment) -> Result<Environment> {
        self.create(environment).await
    }

    /// # Errors
    /// [`BerthError::NotFound`] if the project has no environment of that
    /// name.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn read(&self, key: &EnvironmentKey) -> Result<Environment> {
        let variables = json!({ "name": key.name, "project": key.project_id });
        let data = self.client.execute(ENVIRONMENT_BY_NAME, variables).await?;
        normalize::non_null(&data, "environmentByName")?
            .map(|value| normalize::environment(value, key.project_id))
            .transpose()?
            .ok_or_else(|| BerthError::not_found("Environment", key))
    }

    /// # Errors
    /// [`BerthError::NotFound`] if no environment has that id.
    #[instrument(skip(self))]
    pub async fn read_by_id(&self, id: i64) -> Result<Environment> {
        let data = self.client.execute(ENVIRONMENT_BY_ID, json!({ "id": id })).await?;
        normalize::non_null(&data, "environmentById")?
            .map(|value| normalize::environment(value, 0))
            .transpose()?
            .ok_or_else(|| BerthError::not_found("Environment", id))
    }

    /// Delete the environment and everything deployed in it.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn delete(&self, key: &EnvironmentKey) -> Result<DeleteOutcome> {
        let project = match lookup::project_name(&self.client, key.project_id).await {
            Ok(project) => project,
            Err(err) if err.is_not_found() => {
                debug!("owning project is gone");
                return Ok(DeleteOutcome::AlreadyGone);
            }
            Err(err) => return Err(err),
        };

        let input = json!({ "name": key.name, "project": project, "execute": true });
        let result = self.client.execute(DELETE_ENVIRONMENT, json!({ "input": input })).await;
        delete_outcome("Environment", &key.to_string(), result)
    }
}

impl Diffable for EnvironmentReconciler {
    type Entity = Environment;

    const SCHEMA: DiffSchema = ENVIRONMENT;
}
