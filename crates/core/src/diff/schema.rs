//! Per-kind diff schemas

use berth_domain::{
    DeployType, EnvironmentType, NotificationKind, TaskPermission, TaskType, VariableScope,
};

/// An enum-like field and the canonical spelling of its values.
#[derive(Debug, Clone, Copy)]
pub struct EnumField {
    pub name: &'static str,
    pub canonical: fn(&str) -> Option<&'static str>,
}

impl EnumField {
    const fn new(name: &'static str, canonical: fn(&str) -> Option<&'static str>) -> Self {
        Self { name, canonical }
    }
}

/// Field classification for one resource kind.
#[derive(Debug, Clone, Copy)]
pub struct DiffSchema {
    pub kind: &'static str,
    /// Identity and reference fields; a change forces replacement.
    pub replace_fields: &'static [&'static str],
    /// Enum-like strings compared by the variant they name.
    pub enum_fields: &'static [EnumField],
    /// Remote-assigned or computed fields never reported as drift.
    pub ignored_fields: &'static [&'static str],
    /// No update primitive exists remotely; every change replaces.
    pub replace_on_any_change: bool,
}

impl DiffSchema {
    pub fn is_replace_field(&self, field: &str) -> bool {
        self.replace_on_any_change || self.replace_fields.contains(&field)
    }

    pub fn enum_field(&self, field: &str) -> Option<&EnumField> {
        self.enum_fields.iter().find(|candidate| candidate.name == field)
    }

    pub fn is_ignored(&self, field: &str) -> bool {
        self.ignored_fields.contains(&field)
    }
}

const COMPUTED: &[&str] = &["id", "created"];

pub const PROJECT: DiffSchema = DiffSchema {
    kind: "Project",
    replace_fields: &["name", "deployTargetId"],
    enum_fields: &[],
    ignored_fields: COMPUTED,
    replace_on_any_change: false,
};

pub const ENVIRONMENT: DiffSchema = DiffSchema {
    kind: "Environment",
    replace_fields: &["name", "projectId"],
    enum_fields: &[
        EnumField::new("deployType", DeployType::canonical),
        EnumField::new("environmentType", EnvironmentType::canonical),
    ],
    ignored_fields: &["id", "created", "route", "routes"],
    replace_on_any_change: false,
};

pub const VARIABLE: DiffSchema = DiffSchema {
    kind: "Variable",
    replace_fields: &["name", "projectId", "environmentId"],
    enum_fields: &[EnumField::new("scope", VariableScope::canonical)],
    ignored_fields: COMPUTED,
    replace_on_any_change: false,
};

pub const DEPLOY_TARGET: DiffSchema = DiffSchema {
    kind: "DeployTarget",
    replace_fields: &["name"],
    enum_fields: &[],
    ignored_fields: COMPUTED,
    replace_on_any_change: false,
};

pub const DEPLOY_TARGET_CONFIG: DiffSchema = DiffSchema {
    kind: "DeployTargetConfig",
    replace_fields: &["projectId", "deployTargetId"],
    enum_fields: &[],
    ignored_fields: COMPUTED,
    replace_on_any_change: false,
};

pub const TASK_DEFINITION: DiffSchema = DiffSchema {
    kind: "TaskDefinition",
    replace_fields: &[],
    enum_fields: &[
        EnumField::new("type", TaskType::canonical),
        EnumField::new("taskType", TaskType::canonical),
        EnumField::new("permission", TaskPermission::canonical),
    ],
    ignored_fields: COMPUTED,
    replace_on_any_change: true,
};

pub const NOTIFICATION: DiffSchema = DiffSchema {
    kind: "Notification",
    replace_fields: &["name", "kind", "notificationType"],
    enum_fields: &[
        EnumField::new("kind", NotificationKind::canonical),
        EnumField::new("notificationType", NotificationKind::canonical),
    ],
    ignored_fields: COMPUTED,
    replace_on_any_change: false,
};

pub const PROJECT_NOTIFICATION: DiffSchema = DiffSchema {
    kind: "ProjectNotification",
    replace_fields: &[],
    enum_fields: &[EnumField::new("notificationType", NotificationKind::canonical)],
    ignored_fields: &["id", "projectId"],
    replace_on_any_change: true,
};
