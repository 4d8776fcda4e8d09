//! Resource entities and value types
//!
//! Every entity carries the remote-assigned numeric id as `Option<i64>`; it is
//! `None` until the first successful create.

pub mod deploy_target;
pub mod environment;
pub mod generation;
pub mod notification;
pub mod project;
pub mod task;
pub mod variable;

use serde::{Deserialize, Serialize};

pub use deploy_target::{DeployTarget, DeployTargetConfig, DeployTargetConfigPatch, DeployTargetPatch};
pub use environment::{DeployType, Environment, EnvironmentType};
pub use generation::ApiGeneration;
pub use notification::{Notification, NotificationKind, NotificationPayload, ProjectNotification};
pub use project::{Project, ProjectPatch};
pub use task::{
    TaskArgument, TaskArgumentType, TaskDefinition, TaskPermission, TaskScope, TaskType,
};
pub use variable::{Variable, VariableScope};

/// Result of a delete call.
///
/// `AlreadyGone` is reported when the remote no longer knows the entity, so
/// a concurrent removal is not confused with a failed import lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyGone,
}
