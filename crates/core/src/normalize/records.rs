//! Wire records and their conversion into domain entities

use berth_domain::{
    DeployTarget, DeployTargetConfig, DeployType, Environment, EnvironmentType, Notification,
    NotificationKind, NotificationPayload, Project, ProjectNotification, Result, TaskArgument,
    TaskArgumentType, TaskDefinition, TaskPermission, TaskType, Variable, VariableScope,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use super::relation::{flag, lenient_number, optional_relation_id, relation_id};
use super::{decode, malformed};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRecord {
    #[serde(default, deserialize_with = "optional_relation_id")]
    id: Option<i64>,
    name: String,
    #[serde(default)]
    git_url: Option<String>,
    #[serde(default, alias = "kubernetes", alias = "openshift", deserialize_with = "relation_id")]
    deploy_target: i64,
    #[serde(default)]
    production_environment: Option<String>,
    #[serde(default)]
    branches: Option<String>,
    #[serde(default)]
    pullrequests: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    auto_idle: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    storage_calc: Option<bool>,
    #[serde(default)]
    created: Option<String>,
}

/// Decode a project record.
pub fn project(value: &Value) -> Result<Project> {
    let record: ProjectRecord = decode("Project", value)?;
    Ok(Project {
        id: record.id,
        name: record.name,
        git_url: record.git_url.unwrap_or_default(),
        deploy_target_id: record.deploy_target,
        production_environment: record.production_environment.unwrap_or_default(),
        branches: record.branches,
        pullrequests: record.pullrequests,
        auto_idle: record.auto_idle,
        storage_calc: record.storage_calc,
        created: record.created,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvironmentRecord {
    #[serde(default, deserialize_with = "optional_relation_id")]
    id: Option<i64>,
    name: String,
    #[serde(default, deserialize_with = "relation_id")]
    project: i64,
    #[serde(default)]
    deploy_type: Option<DeployType>,
    #[serde(default)]
    environment_type: Option<EnvironmentType>,
    #[serde(default)]
    deploy_base_ref: Option<String>,
    #[serde(default)]
    deploy_head_ref: Option<String>,
    #[serde(default)]
    deploy_title: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    auto_idle: Option<bool>,
    #[serde(default)]
    route: Option<String>,
    #[serde(default, deserialize_with = "route_list")]
    routes: Vec<String>,
}

/// Decode an environment record. `project_id` fills in the owner when the
/// payload omits it.
pub fn environment(value: &Value, project_id: i64) -> Result<Environment> {
    let record: EnvironmentRecord = decode("Environment", value)?;
    Ok(Environment {
        id: record.id,
        name: record.name,
        project_id: if record.project == 0 { project_id } else { record.project },
        deploy_type: record.deploy_type.unwrap_or_default(),
        environment_type: record.environment_type.unwrap_or_default(),
        deploy_base_ref: record.deploy_base_ref,
        deploy_head_ref: record.deploy_head_ref,
        deploy_title: record.deploy_title,
        auto_idle: record.auto_idle,
        route: record.route.filter(|route| !route.is_empty()),
        routes: record.routes,
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RouteShape {
    List(Vec<String>),
    Joined(String),
}

/// Routes come either as a list or as one comma/newline separated string.
fn route_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let routes = match Option::<RouteShape>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(RouteShape::List(routes)) => routes,
        Some(RouteShape::Joined(joined)) => {
            joined.split([',', '\n']).map(str::to_owned).collect()
        }
    };
    Ok(routes.into_iter().map(|r| r.trim().to_owned()).filter(|r| !r.is_empty()).collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariableRecord {
    #[serde(default, deserialize_with = "optional_relation_id")]
    id: Option<i64>,
    name: String,
    #[serde(default)]
    value: Option<String>,
    scope: VariableScope,
}

/// Decode a variable record; the owner context comes from the lookup that
/// produced it since neither schema echoes it back.
pub fn variable(value: &Value, project_id: i64, environment_id: Option<i64>) -> Result<Variable> {
    let record: VariableRecord = decode("Variable", value)?;
    Ok(Variable {
        id: record.id,
        name: record.name,
        value: record.value.unwrap_or_default(),
        scope: record.scope,
        project_id,
        environment_id,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeployTargetRecord {
    #[serde(default, deserialize_with = "optional_relation_id")]
    id: Option<i64>,
    name: String,
    #[serde(default)]
    console_url: Option<String>,
    #[serde(default)]
    cloud_provider: Option<String>,
    #[serde(default)]
    cloud_region: Option<String>,
    #[serde(default)]
    ssh_host: Option<String>,
    #[serde(default)]
    ssh_port: Option<String>,
    #[serde(default)]
    build_image: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    disabled: Option<bool>,
    #[serde(default)]
    router_pattern: Option<String>,
}

/// Decode a deploy target record. The registration token is write-only and
/// never part of the payload.
pub fn deploy_target(value: &Value) -> Result<DeployTarget> {
    let record: DeployTargetRecord = decode("DeployTarget", value)?;
    Ok(DeployTarget {
        id: record.id,
        name: record.name,
        console_url: record.console_url.unwrap_or_default(),
        token: None,
        cloud_provider: record.cloud_provider,
        cloud_region: record.cloud_region,
        ssh_host: record.ssh_host,
        ssh_port: record.ssh_port,
        build_image: record.build_image,
        disabled: record.disabled.unwrap_or(false),
        router_pattern: record.router_pattern,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeployTargetConfigRecord {
    #[serde(default, deserialize_with = "optional_relation_id")]
    id: Option<i64>,
    #[serde(default, deserialize_with = "relation_id")]
    project: i64,
    #[serde(default, deserialize_with = "relation_id")]
    deploy_target: i64,
    #[serde(default)]
    branches: Option<String>,
    #[serde(default)]
    pullrequests: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    weight: i64,
    #[serde(default)]
    deploy_target_project_pattern: Option<String>,
}

/// Decode a deploy target config record.
pub fn deploy_target_config(value: &Value, project_id: i64) -> Result<DeployTargetConfig> {
    let record: DeployTargetConfigRecord = decode("DeployTargetConfig", value)?;
    Ok(DeployTargetConfig {
        id: record.id,
        project_id: if record.project == 0 { project_id } else { record.project },
        deploy_target_id: record.deploy_target,
        branches: record.branches,
        pullrequests: record.pullrequests,
        weight: record.weight,
        deploy_target_project_pattern: record.deploy_target_project_pattern,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskArgumentRecord {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(rename = "type", default)]
    argument_type: Option<TaskArgumentType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    #[serde(rename = "__typename", default)]
    typename: Option<String>,
    #[serde(default, deserialize_with = "optional_relation_id")]
    id: Option<i64>,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "type", default)]
    task_type: Option<TaskType>,
    #[serde(default)]
    service: Option<String>,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    permission: Option<TaskPermission>,
    #[serde(default)]
    confirmation_text: Option<String>,
    #[serde(default, alias = "advancedTaskDefinitionArguments")]
    arguments: Option<Vec<TaskArgumentRecord>>,
    #[serde(default, deserialize_with = "optional_relation_id")]
    project: Option<i64>,
    #[serde(default, deserialize_with = "optional_relation_id")]
    environment: Option<i64>,
    #[serde(default)]
    group_name: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    system_wide: Option<bool>,
}

/// Decode a task definition from either the per-type union the current
/// schema returns (`__typename` of `AdvancedTaskDefinitionCommand` or
/// `AdvancedTaskDefinitionImage`) or the flat legacy shape with a `type`
/// column.
pub fn task_definition(value: &Value) -> Result<TaskDefinition> {
    let record: TaskRecord = decode("TaskDefinition", value)?;

    let task_type = match record.typename.as_deref() {
        Some("AdvancedTaskDefinitionCommand") => TaskType::Command,
        Some("AdvancedTaskDefinitionImage") => TaskType::Image,
        Some(other)
            if other.starts_with("AdvancedTaskDefinition") && other != "AdvancedTaskDefinition" =>
        {
            return Err(malformed("TaskDefinition", format!("unknown task variant '{other}'")));
        }
        _ => match (record.task_type, &record.image) {
            (Some(task_type), _) => task_type,
            (None, Some(_)) => TaskType::Image,
            (None, None) => TaskType::Command,
        },
    };

    let arguments = record
        .arguments
        .unwrap_or_default()
        .into_iter()
        .map(|argument| TaskArgument {
            name: argument.name,
            display_name: argument.display_name,
            argument_type: argument.argument_type.unwrap_or_default(),
        })
        .collect();

    Ok(TaskDefinition {
        id: record.id,
        name: record.name,
        description: record.description,
        task_type,
        service: record.service.unwrap_or_default(),
        command: record.command.filter(|c| !c.is_empty()),
        image: record.image.filter(|i| !i.is_empty()),
        permission: record.permission,
        confirmation_text: record.confirmation_text,
        arguments,
        project_id: record.project,
        environment_id: record.environment,
        group_name: record.group_name.filter(|g| !g.is_empty()),
        system_wide: record.system_wide.unwrap_or(false),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationRecord {
    #[serde(rename = "__typename", default)]
    typename: Option<String>,
    #[serde(default, deserialize_with = "optional_relation_id")]
    id: Option<i64>,
    name: String,
    #[serde(default)]
    webhook: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    email_address: Option<String>,
}

/// Decode a notification of a known kind.
pub fn notification(value: &Value, kind: NotificationKind) -> Result<Notification> {
    let record: NotificationRecord = decode(kind.typename(), value)?;
    Ok(notification_from_record(record, kind))
}

/// Decode one element of the polymorphic notification list. Unknown
/// variants yield `None`.
pub fn tagged_notification(value: &Value) -> Result<Option<Notification>> {
    let record: NotificationRecord = decode("Notification", value)?;
    let Some(typename) = record.typename.as_deref() else {
        return Err(malformed("Notification", "list element lacks __typename"));
    };
    match NotificationKind::from_typename(typename) {
        Some(kind) => Ok(Some(notification_from_record(record, kind))),
        None => {
            debug!(typename, "skipping unsupported notification variant");
            Ok(None)
        }
    }
}

fn notification_from_record(record: NotificationRecord, kind: NotificationKind) -> Notification {
    let webhook = record.webhook.unwrap_or_default();
    let payload = match kind {
        NotificationKind::Slack => {
            NotificationPayload::Slack { webhook, channel: record.channel.unwrap_or_default() }
        }
        NotificationKind::RocketChat => NotificationPayload::RocketChat {
            webhook,
            channel: record.channel.unwrap_or_default(),
        },
        NotificationKind::Email => NotificationPayload::Email {
            email_address: record.email_address.unwrap_or_default(),
        },
        NotificationKind::MicrosoftTeams => NotificationPayload::MicrosoftTeams { webhook },
    };
    Notification { id: record.id, name: record.name, payload }
}

#[derive(Debug, Deserialize)]
struct LinkRecord {
    #[serde(rename = "__typename")]
    typename: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectLinksRecord {
    #[serde(default, deserialize_with = "optional_relation_id")]
    id: Option<i64>,
    name: String,
    #[serde(default)]
    notifications: Option<Vec<LinkRecord>>,
}

/// Notification links of a project returned by a `notifications { __typename
/// name }` selection.
pub fn project_notifications(value: &Value) -> Result<Vec<ProjectNotification>> {
    let record: ProjectLinksRecord = decode("Project", value)?;
    let links = record
        .notifications
        .unwrap_or_default()
        .into_iter()
        .filter_map(|link| {
            let kind = NotificationKind::from_typename(&link.typename)?;
            Some(ProjectNotification {
                project_id: record.id,
                project_name: record.name.clone(),
                notification_type: kind,
                notification_name: link.name,
            })
        })
        .collect();
    Ok(links)
}
