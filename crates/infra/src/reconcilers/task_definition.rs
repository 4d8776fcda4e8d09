//! Task definition reconciler
//!
//! The current schema addresses the owning project or environment by name and
//! answers with a per-type union (`AdvancedTaskDefinitionCommand` or
//! `AdvancedTaskDefinitionImage`); the legacy schema takes numeric ids and
//! answers with one flat record. There is no update mutation: every change
//! is a replacement.

use std::sync::Arc;

use berth_core::diff::schema::TASK_DEFINITION;
use berth_core::diff::DiffSchema;
use berth_core::{normalize, route};
use berth_domain::{BerthError, DeleteOutcome, Result, TaskDefinition, TaskScope};
use serde_json::{json, Map, Value};
use tracing::{info, instrument};

use super::{compact, delete_outcome, lookup, Diffable};
use crate::graphql::GraphqlClient;

macro_rules! union_selection {
    () => {
        "__typename \
         ... on AdvancedTaskDefinitionCommand { id name description service command permission confirmationText groupName systemWide project { id } environment { id } advancedTaskDefinitionArguments { name displayName type } } \
         ... on AdvancedTaskDefinitionImage { id name description service image permission confirmationText groupName systemWide project { id } environment { id } advancedTaskDefinitionArguments { name displayName type } }"
    };
}

macro_rules! flat_selection {
    () => {
        "id name description type service command image permission confirmationText groupName systemWide project environment arguments { name displayName type }"
    };
}

const ADD_BY_NAME: &str = concat!(
    "mutation AddAdvancedTaskDefinition($input: AdvancedTaskDefinitionInput!) { addAdvancedTaskDefinition(input: $input) { ",
    union_selection!(),
    " } }"
);

const ADD_BY_ID: &str = concat!(
    "mutation AddAdvancedTaskDefinitionById($input: AdvancedTaskDefinitionInput!) { addAdvancedTaskDefinition(input: $input) { ",
    flat_selection!(),
    " } }"
);

const BY_ID_UNION: &str = concat!(
    "query AdvancedTaskDefinitionById($id: Int!) { advancedTaskDefinitionById(id: $id) { ",
    union_selection!(),
    " } }"
);

const BY_ID_FLAT: &str = concat!(
    "query AdvancedTaskDefinitionByIdFlat($id: Int!) { advancedTaskDefinitionById(id: $id) { ",
    flat_selection!(),
    " } }"
);

const FOR_ENVIRONMENT_UNION: &str = concat!(
    "query AdvancedTasksForEnvironment($environment: Int!) { advancedTasksForEnvironment(environment: $environment) { ",
    union_selection!(),
    " } }"
);

const FOR_ENVIRONMENT_FLAT: &str = concat!(
    "query AdvancedTasksForEnvironmentFlat($environment: Int!) { advancedTasksForEnvironment(environment: $environment) { ",
    flat_selection!(),
    " } }"
);

const DELETE_TASK: &str = "mutation DeleteAdvancedTaskDefinition($id: Int!) { deleteAdvancedTaskDefinition(advancedTaskDefinition: $id) }";

#[derive(Debug, Clone)]
pub struct TaskDefinitionReconciler {
    client: Arc<GraphqlClient>,
}

impl TaskDefinitionReconciler {
    pub fn new(client: Arc<GraphqlClient>) -> Self {
        Self { client }
    }

    /// # Errors
    /// Validation errors (scope, type/payload mismatch) before any call,
    /// otherwise the client's errors.
    #[instrument(skip(self, task), fields(name = %task.name))]
    pub async fn create(&self, task: &TaskDefinition) -> Result<TaskDefinition> {
        task.validate()?;
        let scope = task.scope()?;
        let generation = self.client.generation().await;
        let created = route(
            "addAdvancedTaskDefinition",
            generation,
            || self.add_by_name(task, &scope),
            || self.add_by_id(task, &scope),
        )
        .await?;
        info!(id = ?created.id, scope = scope.label(), "created task definition");
        Ok(created)
    }

    /// # Errors
    /// [`BerthError::NotFound`] if no task definition has that id.
    #[instrument(skip(self))]
    pub async fn read(&self, id: i64) -> Result<TaskDefinition> {
        let generation = self.client.generation().await;
        let data = route(
            "advancedTaskDefinitionById",
            generation,
            || self.client.execute(BY_ID_UNION, json!({ "id": id })),
            || self.client.execute(BY_ID_FLAT, json!({ "id": id })),
        )
        .await?;
        normalize::non_null(&data, "advancedTaskDefinitionById")?
            .map(normalize::task_definition)
            .transpose()?
            .ok_or_else(|| BerthError::not_found("TaskDefinition", id))
    }

    /// Task definitions visible to one environment, including those
    /// inherited from its project, group or the whole system.
    #[instrument(skip(self))]
    pub async fn list_for_environment(&self, environment_id: i64) -> Result<Vec<TaskDefinition>> {
        let generation = self.client.generation().await;
        let variables = json!({ "environment": environment_id });
        let data = route(
            "advancedTasksForEnvironment",
            generation,
            || self.client.execute(FOR_ENVIRONMENT_UNION, variables.clone()),
            || self.client.execute(FOR_ENVIRONMENT_FLAT, variables.clone()),
        )
        .await?;
        normalize::list(
            normalize::field(&data, "advancedTasksForEnvironment")?,
            normalize::task_definition,
        )
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<DeleteOutcome> {
        let result = self.client.execute(DELETE_TASK, json!({ "id": id })).await;
        delete_outcome("TaskDefinition", &id.to_string(), result)
    }

    async fn add_by_name(&self, task: &TaskDefinition, scope: &TaskScope) -> Result<TaskDefinition> {
        let mut input = common_input(task);
        match scope {
            TaskScope::Project(project_id) => {
                let project = lookup::project_name(&self.client, *project_id).await?;
                input.insert("project".into(), Value::from(project));
            }
            TaskScope::Environment(environment_id) => {
                let (project, environment) =
                    lookup::environment_names(&self.client, *environment_id).await?;
                input.insert("project".into(), Value::from(project));
                input.insert("environment".into(), Value::from(environment));
            }
            TaskScope::Group(_) | TaskScope::SystemWide => {}
        }
        input.insert("advancedTaskDefinitionArguments".into(), arguments(task));

        let data = self.client.execute(ADD_BY_NAME, json!({ "input": input })).await?;
        let created = normalize::task_definition(normalize::field(&data, "addAdvancedTaskDefinition")?)?;
        Ok(with_scope(created, scope))
    }

    async fn add_by_id(&self, task: &TaskDefinition, scope: &TaskScope) -> Result<TaskDefinition> {
        let mut input = common_input(task);
        match scope {
            TaskScope::Project(project_id) => {
                input.insert("project".into(), Value::from(*project_id));
            }
            TaskScope::Environment(environment_id) => {
                input.insert("environment".into(), Value::from(*environment_id));
            }
            TaskScope::Group(_) | TaskScope::SystemWide => {}
        }
        input.insert("arguments".into(), arguments(task));

        let data = self.client.execute(ADD_BY_ID, json!({ "input": input })).await?;
        let created = normalize::task_definition(normalize::field(&data, "addAdvancedTaskDefinition")?)?;
        Ok(with_scope(created, scope))
    }
}

/// Input members shared by both generations.
fn common_input(task: &TaskDefinition) -> Map<String, Value> {
    let input = compact(json!({
        "name": task.name,
        "description": task.description,
        "type": task.task_type.as_wire(),
        "service": task.service,
        "command": task.command,
        "image": task.image,
        "permission": task.permission.map(|p| p.as_wire()),
        "confirmationText": task.confirmation_text,
        "groupName": task.group_name,
        "systemWide": task.system_wide.then_some(true),
    }));
    match input {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn arguments(task: &TaskDefinition) -> Value {
    task.arguments
        .iter()
        .map(|argument| {
            compact(json!({
                "name": argument.name,
                "displayName": argument.display_name,
                "type": argument.argument_type.as_wire(),
            }))
        })
        .collect()
}

/// Responses do not always echo the owner back; keep the scope the
/// definition was created with.
fn with_scope(mut task: TaskDefinition, scope: &TaskScope) -> TaskDefinition {
    match scope {
        TaskScope::Project(id) => task.project_id = Some(*id),
        TaskScope::Environment(id) => task.environment_id = Some(*id),
        TaskScope::Group(name) => task.group_name = Some(name.clone()),
        TaskScope::SystemWide => task.system_wide = true,
    }
    task
}

impl Diffable for TaskDefinitionReconciler {
    type Entity = TaskDefinition;

    const SCHEMA: DiffSchema = TASK_DEFINITION;
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use berth_core::ports::{GraphqlRequest, GraphqlTransport};
    use berth_domain::{ApiGeneration, ClientConfig, TaskType};

    use super::*;

    #[derive(Default)]
    struct FakeSchema {
        inputs: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl GraphqlTransport for FakeSchema {
        async fn send(&self, request: &GraphqlRequest, _token: Option<&str>) -> Result<Value> {
            let operation = crate::graphql::client::operation_name(&request.query).to_owned();
            self.inputs.lock().unwrap().push((operation.clone(), request.variables.clone()));
            match operation.as_str() {
                "EnvironmentNames" => Ok(json!({
                    "environmentById": { "id": 9, "name": "main", "project": { "id": 7, "name": "shop" } }
                })),
                "AddAdvancedTaskDefinition" => Ok(json!({
                    "addAdvancedTaskDefinition": {
                        "__typename": "AdvancedTaskDefinitionCommand",
                        "id": 31,
                        "name": "drush-cr",
                        "service": "cli",
                        "command": "drush cr",
                        "environment": { "id": 9 },
                        "advancedTaskDefinitionArguments": []
                    }
                })),
                "AddAdvancedTaskDefinitionById" => Ok(json!({
                    "addAdvancedTaskDefinition": {
                        "id": 32,
                        "name": "drush-cr",
                        "type": "COMMAND",
                        "service": "cli",
                        "command": "drush cr",
                        "environment": 9
                    }
                })),
                "AdvancedTaskDefinitionByIdFlat" => Ok(json!({ "advancedTaskDefinitionById": null })),
                other => Err(BerthError::Api(format!("unexpected operation {other}"))),
            }
        }
    }

    fn reconciler(schema: Arc<FakeSchema>, generation: ApiGeneration) -> TaskDefinitionReconciler {
        let client = GraphqlClient::builder(
            ClientConfig::new("https://api.example.com/graphql").with_generation(generation),
        )
        .transport(schema)
        .build()
        .unwrap();
        TaskDefinitionReconciler::new(Arc::new(client))
    }

    fn drush_cr() -> TaskDefinition {
        TaskDefinition {
            name: "drush-cr".into(),
            service: "cli".into(),
            command: Some("drush cr".into()),
            environment_id: Some(9),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn current_generation_sends_names() {
        let schema = Arc::new(FakeSchema::default());
        let created =
            reconciler(schema.clone(), ApiGeneration::Current).create(&drush_cr()).await.unwrap();

        assert_eq!(created.id, Some(31));
        assert_eq!(created.task_type, TaskType::Command);
        assert_eq!(created.environment_id, Some(9));

        let inputs = schema.inputs.lock().unwrap();
        let (_, variables) = &inputs[1];
        assert_eq!(variables["input"]["environment"], "main");
        assert_eq!(variables["input"]["project"], "shop");
        assert_eq!(variables["input"]["type"], "COMMAND");
    }

    #[tokio::test]
    async fn legacy_generation_sends_ids() {
        let schema = Arc::new(FakeSchema::default());
        let created =
            reconciler(schema.clone(), ApiGeneration::Legacy).create(&drush_cr()).await.unwrap();

        assert_eq!(created.id, Some(32));
        let inputs = schema.inputs.lock().unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].1["input"]["environment"], 9);
    }

    #[tokio::test]
    async fn two_scopes_are_rejected_locally() {
        let schema = Arc::new(FakeSchema::default());
        let task = TaskDefinition { project_id: Some(7), ..drush_cr() };
        let err = reconciler(schema.clone(), ApiGeneration::Current).create(&task).await;
        assert!(matches!(err, Err(BerthError::Validation { field, .. }) if field == "scope"));
        assert!(schema.inputs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn null_by_id_is_not_found() {
        let schema = Arc::new(FakeSchema::default());
        let err = reconciler(schema, ApiGeneration::Legacy).read(404).await.unwrap_err();
        assert_eq!(err, BerthError::not_found("TaskDefinition", 404));
    }
}
