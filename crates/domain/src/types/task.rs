//! Scheduled/on-demand task definitions

use serde::{Deserialize, Serialize};

use crate::errors::{BerthError, Result};
use crate::impl_wire_enum;

/// Whether a task runs a command in an existing service or a dedicated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskType {
    #[default]
    Command,
    Image,
}

impl_wire_enum!(TaskType {
    Command => "command" / "COMMAND",
    Image => "image" / "IMAGE",
});

/// Minimum role allowed to trigger the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskPermission {
    Guest,
    #[default]
    Developer,
    Maintainer,
}

impl_wire_enum!(TaskPermission {
    Guest => "guest" / "GUEST",
    Developer => "developer" / "DEVELOPER",
    Maintainer => "maintainer" / "MAINTAINER",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskArgumentType {
    #[default]
    String,
    EnvironmentSourceName,
    EnvironmentSourceNameExcludeSelf,
}

impl_wire_enum!(TaskArgumentType {
    String => "string" / "STRING",
    EnvironmentSourceName => "environment_source_name" / "ENVIRONMENT_SOURCE_NAME",
    EnvironmentSourceNameExcludeSelf =>
        "environment_source_name_exclude_self" / "ENVIRONMENT_SOURCE_NAME_EXCLUDE_SELF",
});

/// One user-supplied argument; order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskArgument {
    pub name: String,
    pub display_name: Option<String>,
    #[serde(rename = "type", default)]
    pub argument_type: TaskArgumentType,
}

/// The single context a task definition belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskScope {
    Project(i64),
    Environment(i64),
    Group(String),
    SystemWide,
}

impl TaskScope {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Project(_) => "project",
            Self::Environment(_) => "environment",
            Self::Group(_) => "group",
            Self::SystemWide => "system-wide",
        }
    }
}

/// A named task users can run against environments.
///
/// The remote API has no update primitive: every change replaces the
/// definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub task_type: TaskType,
    pub service: String,
    pub command: Option<String>,
    pub image: Option<String>,
    pub permission: Option<TaskPermission>,
    pub confirmation_text: Option<String>,
    #[serde(default)]
    pub arguments: Vec<TaskArgument>,
    pub project_id: Option<i64>,
    pub environment_id: Option<i64>,
    pub group_name: Option<String>,
    #[serde(default)]
    pub system_wide: bool,
}

impl TaskDefinition {
    /// Resolve the single scope this definition belongs to.
    ///
    /// # Errors
    /// Returns [`BerthError::Validation`] unless exactly one of project,
    /// environment, group or system-wide is set.
    pub fn scope(&self) -> Result<TaskScope> {
        let mut scopes = Vec::with_capacity(1);
        if let Some(id) = self.project_id {
            scopes.push(TaskScope::Project(id));
        }
        if let Some(id) = self.environment_id {
            scopes.push(TaskScope::Environment(id));
        }
        if let Some(group) = &self.group_name {
            scopes.push(TaskScope::Group(group.clone()));
        }
        if self.system_wide {
            scopes.push(TaskScope::SystemWide);
        }

        match scopes.len() {
            1 => Ok(scopes.remove(0)),
            0 => Err(BerthError::validation(
                "scope",
                "one of projectId, environmentId, groupName or systemWide is required",
            )),
            _ => {
                let labels: Vec<_> = scopes.iter().map(TaskScope::label).collect();
                Err(BerthError::validation(
                    "scope",
                    format!("scopes are mutually exclusive, got {}", labels.join(", ")),
                ))
            }
        }
    }

    /// # Errors
    /// Returns [`BerthError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BerthError::validation("name", "must not be empty"));
        }
        self.scope()?;
        match self.task_type {
            TaskType::Command if blank(self.command.as_deref()) => Err(BerthError::validation(
                "command",
                "command tasks need a command",
            )),
            TaskType::Image if blank(self.image.as_deref()) => {
                Err(BerthError::validation("image", "image tasks need an image"))
            }
            TaskType::Command if self.image.is_some() => Err(BerthError::validation(
                "image",
                "command tasks cannot set an image",
            )
            .with_suggestion("type = \"image\"")),
            _ => Ok(()),
        }
    }
}

fn blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command_task() -> TaskDefinition {
        TaskDefinition {
            name: "drush-cr".into(),
            service: "cli".into(),
            command: Some("drush cr".into()),
            environment_id: Some(9),
            ..Default::default()
        }
    }

    #[test]
    fn exactly_one_scope_is_required() {
        assert_eq!(command_task().scope().unwrap(), TaskScope::Environment(9));

        let none = TaskDefinition { environment_id: None, ..command_task() };
        assert!(none.scope().is_err());

        let both = TaskDefinition { project_id: Some(1), ..command_task() };
        let err = both.scope().unwrap_err();
        assert!(err.to_string().contains("project, environment"));
    }

    #[test]
    fn command_type_needs_command() {
        let task = TaskDefinition { command: None, ..command_task() };
        assert!(matches!(task.validate(), Err(BerthError::Validation { field, .. }) if field == "command"));
    }

    #[test]
    fn image_type_needs_image() {
        let task = TaskDefinition {
            task_type: TaskType::Image,
            command: None,
            image: Some("registry.example.com/tasks/db-dump:1.2".into()),
            ..command_task()
        };
        assert!(task.validate().is_ok());

        let task = TaskDefinition { image: None, ..task };
        assert!(matches!(task.validate(), Err(BerthError::Validation { field, .. }) if field == "image"));
    }

    #[test]
    fn system_wide_scope() {
        let task = TaskDefinition { environment_id: None, system_wide: true, ..command_task() };
        assert_eq!(task.scope().unwrap(), TaskScope::SystemWide);
    }
}
