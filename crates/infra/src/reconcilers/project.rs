//! Project reconciler

use std::sync::Arc;

use berth_core::diff::schema::PROJECT;
use berth_core::diff::DiffSchema;
use berth_core::normalize;
use berth_domain::{BerthError, DeleteOutcome, Project, ProjectPatch, Result};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::{compact, delete_outcome, flag, Diffable};
use crate::graphql::GraphqlClient;

macro_rules! project_fields {
    () => {
        "id name gitUrl productionEnvironment branches pullrequests autoIdle storageCalc created kubernetes { id name }"
    };
}

const ADD_PROJECT: &str = concat!(
    "mutation AddProject($input: AddProjectInput!) { addProject(input: $input) { ",
    project_fields!(),
    " } }"
);

const UPDATE_PROJECT: &str = concat!(
    "mutation UpdateProject($input: UpdateProjectInput!) { updateProject(input: $input) { ",
    project_fields!(),
    " } }"
);

const DELETE_PROJECT: &str =
    "mutation DeleteProject($input: DeleteProjectInput!) { deleteProject(input: $input) }";

const PROJECT_BY_NAME: &str = concat!(
    "query ProjectByName($name: String!) { projectByName(name: $name) { ",
    project_fields!(),
    " } }"
);

const ALL_PROJECTS: &str = concat!("query AllProjects { allProjects { ", project_fields!(), " } }");

/// Projects: add, update, delete, get-by-name and list-all.
#[derive(Debug, Clone)]
pub struct ProjectReconciler {
    client: Arc<GraphqlClient>,
}

impl ProjectReconciler {
    pub fn new(client: Arc<GraphqlClient>) -> Self {
        Self { client }
    }

    /// # Errors
    /// Validation errors before any call, otherwise the client's errors.
    #[instrument(skip(self, project), fields(name = %project.name))]
    pub async fn create(&self, project: &Project) -> Result<Project> {
        project.validate()?;
        let input = compact(json!({
            "name": project.name,
            "gitUrl": project.git_url,
            "kubernetes": project.deploy_target_id,
            "productionEnvironment": project.production_environment,
            "branches": project.branches,
            "pullrequests": project.pullrequests,
            "autoIdle": flag(project.auto_idle),
            "storageCalc": flag(project.storage_calc),
        }));

        let data = self.client.execute(ADD_PROJECT, json!({ "input": input })).await?;
        let created = normalize::project(normalize::field(&data, "addProject")?)?;
        info!(id = ?created.id, "created project");
        Ok(created)
    }

    /// Look a project up by its unique name.
    ///
    /// # Errors
    /// [`BerthError::NotFound`] if no project has that name.
    #[instrument(skip(self))]
    pub async fn read(&self, name: &str) -> Result<Project> {
        let data = self.client.execute(PROJECT_BY_NAME, json!({ "name": name })).await?;
        normalize::non_null(&data, "projectByName")?
            .map(normalize::project)
            .transpose()?
            .ok_or_else(|| BerthError::not_found("Project", name))
    }

    /// Look a project up by numeric id, listing all projects.
    ///
    /// # Errors
    /// [`BerthError::NotFound`] if no project has that id.
    #[instrument(skip(self))]
    pub async fn read_by_id(&self, id: i64) -> Result<Project> {
        self.list()
            .await?
            .into_iter()
            .find(|project| project.id == Some(id))
            .ok_or_else(|| BerthError::not_found("Project", id))
    }

    pub async fn list(&self) -> Result<Vec<Project>> {
        let data = self.client.execute(ALL_PROJECTS, json!({})).await?;
        normalize::list(normalize::field(&data, "allProjects")?, normalize::project)
    }

    /// Apply `patch` in place. An empty patch only re-reads the project.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i64, patch: &ProjectPatch) -> Result<Project> {
        if patch.is_empty() {
            return self.read_by_id(id).await;
        }

        let mut patch_value = serde_json::to_value(patch)
            .map_err(|err| BerthError::validation("patch", err.to_string()))?;
        if let Value::Object(map) = &mut patch_value {
            for key in ["autoIdle", "storageCalc"] {
                if let Some(enabled) = map.get(key).and_then(Value::as_bool) {
                    map.insert(key.to_owned(), flag(Some(enabled)));
                }
            }
        }

        let input = json!({ "id": id, "patch": patch_value });
        let data = self.client.execute(UPDATE_PROJECT, json!({ "input": input })).await?;
        normalize::project(normalize::field(&data, "updateProject")?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<DeleteOutcome> {
        let result =
            self.client.execute(DELETE_PROJECT, json!({ "input": { "project": name } })).await;
        delete_outcome("Project", name, result)
    }
}

impl Diffable for ProjectReconciler {
    type Entity = Project;

    const SCHEMA: DiffSchema = PROJECT;
}
