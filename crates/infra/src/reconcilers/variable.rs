//! Variable reconciler
//!
//! Variables are addressed differently by the two schema generations. The
//! current schema keys them by project and environment *name* and offers an
//! upsert; the legacy schema keys them by numeric owner id and only has add
//! and delete. Every operation goes through [`route`], so a current-path call
//! rejected for unknown fields or arguments is replayed on the legacy path.

use std::sync::Arc;

use berth_core::diff::schema::VARIABLE;
use berth_core::diff::DiffSchema;
use berth_core::import_key::VariableKey;
use berth_core::{normalize, route};
use berth_domain::{BerthError, DeleteOutcome, Result, Variable};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use super::{compact, delete_outcome, lookup, Diffable};
use crate::graphql::GraphqlClient;

const UPSERT_BY_NAME: &str = r"
    mutation AddOrUpdateEnvVariableByName($input: EnvVariableByNameInput!) {
        addOrUpdateEnvVariableByName(input: $input) {
            id
            name
            value
            scope
        }
    }
";

const LIST_BY_NAME: &str = r"
    query EnvVariablesByProjectEnvironmentName($input: EnvVariableByProjectEnvironmentNameInput!) {
        getEnvVariablesByProjectEnvironmentName(input: $input) {
            id
            name
            value
            scope
        }
    }
";

const DELETE_BY_NAME: &str = r"
    mutation DeleteEnvVariableByName($input: DeleteEnvVariableByNameInput!) {
        deleteEnvVariableByName(input: $input)
    }
";

const ADD_BY_ID: &str = r"
    mutation AddEnvVariable($input: EnvVariableInput!) {
        addEnvVariable(input: $input) {
            id
            name
            value
            scope
        }
    }
";

const PROJECT_VARIABLES_BY_ID: &str = r"
    query ProjectEnvVariables($id: Int!) {
        projectById(id: $id) {
            id
            envVariables {
                id
                name
                value
                scope
            }
        }
    }
";

const ENVIRONMENT_VARIABLES_BY_ID: &str = r"
    query EnvironmentEnvVariables($id: Int!) {
        environmentById(id: $id) {
            id
            envVariables {
                id
                name
                value
                scope
            }
        }
    }
";

const DELETE_BY_ID: &str = r"
    mutation DeleteEnvVariable($input: DeleteEnvVariableInput!) {
        deleteEnvVariable(input: $input)
    }
";

/// Project and environment names a name-keyed operation is addressed by.
struct Owner {
    project: String,
    environment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VariableReconciler {
    client: Arc<GraphqlClient>,
}

impl VariableReconciler {
    pub fn new(client: Arc<GraphqlClient>) -> Self {
        Self { client }
    }

    /// # Errors
    /// Validation errors before any call, otherwise the client's errors.
    #[instrument(skip(self, variable), fields(name = %variable.name, project_id = variable.project_id))]
    pub async fn create(&self, variable: &Variable) -> Result<Variable> {
        variable.validate()?;
        let generation = self.client.generation().await;
        route(
            "addOrUpdateEnvVariableByName",
            generation,
            || self.upsert_by_name(variable),
            || self.add_by_id(variable),
        )
        .await
    }

    /// Replace the value and scope of an existing variable.
    ///
    /// On the legacy schema, which has no update primitive, the variable is
    /// deleted and added again.
    #[instrument(skip(self, variable), fields(name = %variable.name, project_id = variable.project_id))]
    pub async fn update(&self, variable: &Variable) -> Result<Variable> {
        variable.validate()?;
        let generation = self.client.generation().await;
        route(
            "addOrUpdateEnvVariableByName",
            generation,
            || self.upsert_by_name(variable),
            || self.replace_by_id(variable),
        )
        .await
    }

    /// # Errors
    /// [`BerthError::NotFound`] if the owner has no variable of that name.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn read(&self, key: &VariableKey) -> Result<Variable> {
        let generation = self.client.generation().await;
        let variables = route(
            "getEnvVariablesByProjectEnvironmentName",
            generation,
            || self.list_by_name(key),
            || self.list_by_id(key),
        )
        .await?;

        variables
            .into_iter()
            .find(|variable| variable.name == key.name)
            .ok_or_else(|| BerthError::not_found("Variable", key))
    }

    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn delete(&self, key: &VariableKey) -> Result<DeleteOutcome> {
        let generation = self.client.generation().await;
        let result = route(
            "deleteEnvVariableByName",
            generation,
            || self.delete_by_name(key),
            || self.delete_by_id(key),
        )
        .await;
        delete_outcome("Variable", &key.to_string(), result)
    }

    async fn owner(&self, project_id: i64, environment_id: Option<i64>) -> Result<Owner> {
        match environment_id {
            Some(environment_id) => {
                let (project, environment) =
                    lookup::environment_names(&self.client, environment_id).await?;
                Ok(Owner { project, environment: Some(environment) })
            }
            None => Ok(Owner {
                project: lookup::project_name(&self.client, project_id).await?,
                environment: None,
            }),
        }
    }

    async fn upsert_by_name(&self, variable: &Variable) -> Result<Variable> {
        let owner = self.owner(variable.project_id, variable.environment_id).await?;
        let input = compact(json!({
            "project": owner.project,
            "environment": owner.environment,
            "name": variable.name,
            "scope": variable.scope.as_wire(),
            "value": variable.value,
        }));

        let data = self.client.execute(UPSERT_BY_NAME, json!({ "input": input })).await?;
        let saved = normalize::variable(
            normalize::field(&data, "addOrUpdateEnvVariableByName")?,
            variable.project_id,
            variable.environment_id,
        )?;
        info!(id = ?saved.id, "saved variable by name");
        Ok(saved)
    }

    async fn list_by_name(&self, key: &VariableKey) -> Result<Vec<Variable>> {
        let owner = self.owner(key.project_id, key.environment_id).await?;
        let input = compact(json!({ "project": owner.project, "environment": owner.environment }));
        let data = self.client.execute(LIST_BY_NAME, json!({ "input": input })).await?;
        normalize::list(normalize::field(&data, "getEnvVariablesByProjectEnvironmentName")?, |v| {
            normalize::variable(v, key.project_id, key.environment_id)
        })
    }

    async fn delete_by_name(&self, key: &VariableKey) -> Result<Value> {
        let owner = self.owner(key.project_id, key.environment_id).await?;
        let input = compact(json!({
            "project": owner.project,
            "environment": owner.environment,
            "name": key.name,
        }));
        self.client.execute(DELETE_BY_NAME, json!({ "input": input })).await
    }

    async fn add_by_id(&self, variable: &Variable) -> Result<Variable> {
        let (owner_type, owner_id) = match variable.environment_id {
            Some(environment_id) => ("ENVIRONMENT", environment_id),
            None => ("PROJECT", variable.project_id),
        };
        let input = json!({
            "type": owner_type,
            "typeId": owner_id,
            "name": variable.name,
            "value": variable.value,
            "scope": variable.scope.as_wire(),
        });

        let data = self.client.execute(ADD_BY_ID, json!({ "input": input })).await?;
        let saved = normalize::variable(
            normalize::field(&data, "addEnvVariable")?,
            variable.project_id,
            variable.environment_id,
        )?;
        info!(id = ?saved.id, "added variable by id");
        Ok(saved)
    }

    /// Delete-then-add. If the add is rejected the previous record is added
    /// back so a failed update never leaves the variable missing.
    async fn replace_by_id(&self, variable: &Variable) -> Result<Variable> {
        let key = VariableKey {
            project_id: variable.project_id,
            environment_id: variable.environment_id,
            name: variable.name.clone(),
        };
        let previous = self.list_by_id(&key).await?.into_iter().find(|v| v.name == key.name);

        match previous.as_ref().and_then(|v| v.id) {
            Some(id) => {
                self.delete_id(id).await?;
            }
            None => debug!("no previous variable to replace"),
        }

        match self.add_by_id(variable).await {
            Ok(saved) => Ok(saved),
            Err(err) => {
                if let Some(previous) = previous {
                    warn!(error = %err, "add rejected, restoring previous variable");
                    if let Err(restore) = self.add_by_id(&previous).await {
                        error!(error = %restore, "failed to restore previous variable");
                    }
                }
                Err(err)
            }
        }
    }

    async fn list_by_id(&self, key: &VariableKey) -> Result<Vec<Variable>> {
        let (query, root, owner_id) = match key.environment_id {
            Some(environment_id) => (ENVIRONMENT_VARIABLES_BY_ID, "environmentById", environment_id),
            None => (PROJECT_VARIABLES_BY_ID, "projectById", key.project_id),
        };

        let data = self.client.execute(query, json!({ "id": owner_id })).await?;
        let owner = normalize::non_null(&data, root)?.ok_or_else(|| {
            let kind = if key.environment_id.is_some() { "Environment" } else { "Project" };
            BerthError::not_found(kind, owner_id)
        })?;
        let variables = owner.get("envVariables").unwrap_or(&Value::Null);
        normalize::list(variables, |v| normalize::variable(v, key.project_id, key.environment_id))
    }

    async fn delete_by_id(&self, key: &VariableKey) -> Result<Value> {
        let id = self
            .list_by_id(key)
            .await?
            .into_iter()
            .find(|variable| variable.name == key.name)
            .and_then(|variable| variable.id)
            .ok_or_else(|| BerthError::not_found("Variable", key))?;
        self.delete_id(id).await
    }

    async fn delete_id(&self, id: i64) -> Result<Value> {
        self.client.execute(DELETE_BY_ID, json!({ "input": { "id": id } })).await
    }
}

impl Diffable for VariableReconciler {
    type Entity = Variable;

    const SCHEMA: DiffSchema = VARIABLE;
}
