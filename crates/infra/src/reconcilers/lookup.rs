//! Auxiliary id-to-name lookups for name-keyed operations

use berth_core::normalize::{self, relation_id_of};
use berth_domain::{BerthError, Result};
use serde_json::{json, Value};
use tracing::debug;

use crate::graphql::GraphqlClient;

const ALL_PROJECT_NAMES: &str = r"
    query AllProjectNames {
        allProjects {
            id
            name
        }
    }
";

const ENVIRONMENT_NAMES: &str = r"
    query EnvironmentNames($id: Int!) {
        environmentById(id: $id) {
            id
            name
            project {
                id
                name
            }
        }
    }
";

/// Name of project `project_id`, found by listing all projects.
pub(super) async fn project_name(client: &GraphqlClient, project_id: i64) -> Result<String> {
    let data = client.execute(ALL_PROJECT_NAMES, json!({})).await?;
    let projects = normalize::field(&data, "allProjects")?;
    let name = projects
        .as_array()
        .into_iter()
        .flatten()
        .find(|project| project.get("id").and_then(relation_id_of) == Some(project_id))
        .and_then(|project| project.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| BerthError::not_found("Project", project_id))?;

    debug!(project_id, name, "resolved project name");
    Ok(name.to_owned())
}

/// Project and environment names of environment `environment_id`.
pub(super) async fn environment_names(
    client: &GraphqlClient,
    environment_id: i64,
) -> Result<(String, String)> {
    let data = client.execute(ENVIRONMENT_NAMES, json!({ "id": environment_id })).await?;
    let environment = normalize::non_null(&data, "environmentById")?
        .ok_or_else(|| BerthError::not_found("Environment", environment_id))?;

    let name = environment.get("name").and_then(Value::as_str);
    let project = environment.get("project").and_then(|p| p.get("name")).and_then(Value::as_str);
    match (project, name) {
        (Some(project), Some(name)) => {
            debug!(environment_id, project, name, "resolved environment name");
            Ok((project.to_owned(), name.to_owned()))
        }
        _ => Err(BerthError::Api(format!(
            "unexpected Environment payload: environment {environment_id} lacks project or name"
        ))),
    }
}
