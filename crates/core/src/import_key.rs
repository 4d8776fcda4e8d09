//! Composite import keys
//!
//! Import and refresh flows identify an existing remote resource with a
//! colon-delimited key. Parsing re-derives the lookup path a read needs;
//! `Display` renders the canonical key back.

use std::fmt;
use std::str::FromStr;

use berth_domain::constants::IMPORT_KEY_SEPARATOR;
use berth_domain::{BerthError, NotificationKind, Result};

fn invalid(raw: &str, expected: &str) -> BerthError {
    BerthError::validation("id", format!("malformed import key '{raw}'")).with_suggestion(expected)
}

fn parts(raw: &str) -> Vec<&str> {
    raw.split(IMPORT_KEY_SEPARATOR).map(str::trim).collect()
}

fn numeric(raw: &str, part: &str, expected: &str) -> Result<i64> {
    part.parse::<i64>().ok().filter(|id| *id > 0).ok_or_else(|| invalid(raw, expected))
}

fn non_empty<'a>(raw: &str, part: &'a str, expected: &str) -> Result<&'a str> {
    if part.is_empty() {
        Err(invalid(raw, expected))
    } else {
        Ok(part)
    }
}

/// `projectId:name` or `projectId:environmentId:name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableKey {
    pub project_id: i64,
    pub environment_id: Option<i64>,
    pub name: String,
}

impl VariableKey {
    pub const FORMAT: &'static str = "projectId:name or projectId:environmentId:name";
}

impl FromStr for VariableKey {
    type Err = BerthError;

    fn from_str(raw: &str) -> Result<Self> {
        match parts(raw).as_slice() {
            [project, name] => Ok(Self {
                project_id: numeric(raw, project, Self::FORMAT)?,
                environment_id: None,
                name: non_empty(raw, name, Self::FORMAT)?.to_owned(),
            }),
            [project, environment, name] => Ok(Self {
                project_id: numeric(raw, project, Self::FORMAT)?,
                environment_id: Some(numeric(raw, environment, Self::FORMAT)?),
                name: non_empty(raw, name, Self::FORMAT)?.to_owned(),
            }),
            _ => Err(invalid(raw, Self::FORMAT)),
        }
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.environment_id {
            Some(environment_id) => write!(f, "{}:{environment_id}:{}", self.project_id, self.name),
            None => write!(f, "{}:{}", self.project_id, self.name),
        }
    }
}

/// `projectId:environmentName`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentKey {
    pub project_id: i64,
    pub name: String,
}

impl EnvironmentKey {
    pub const FORMAT: &'static str = "projectId:environmentName";
}

impl FromStr for EnvironmentKey {
    type Err = BerthError;

    fn from_str(raw: &str) -> Result<Self> {
        match parts(raw).as_slice() {
            [project, name] => Ok(Self {
                project_id: numeric(raw, project, Self::FORMAT)?,
                name: non_empty(raw, name, Self::FORMAT)?.to_owned(),
            }),
            _ => Err(invalid(raw, Self::FORMAT)),
        }
    }
}

impl fmt::Display for EnvironmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project_id, self.name)
    }
}

/// `projectId:configId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployTargetConfigKey {
    pub project_id: i64,
    pub config_id: i64,
}

impl DeployTargetConfigKey {
    pub const FORMAT: &'static str = "projectId:configId";
}

impl FromStr for DeployTargetConfigKey {
    type Err = BerthError;

    fn from_str(raw: &str) -> Result<Self> {
        match parts(raw).as_slice() {
            [project, config] => Ok(Self {
                project_id: numeric(raw, project, Self::FORMAT)?,
                config_id: numeric(raw, config, Self::FORMAT)?,
            }),
            _ => Err(invalid(raw, Self::FORMAT)),
        }
    }
}

impl fmt::Display for DeployTargetConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project_id, self.config_id)
    }
}

/// `notificationType:name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationKey {
    pub kind: NotificationKind,
    pub name: String,
}

impl NotificationKey {
    pub const FORMAT: &'static str = "notificationType:name";
}

impl FromStr for NotificationKey {
    type Err = BerthError;

    fn from_str(raw: &str) -> Result<Self> {
        match parts(raw).as_slice() {
            [kind, name] => Ok(Self {
                kind: kind.parse().map_err(|_| invalid(raw, Self::FORMAT))?,
                name: non_empty(raw, name, Self::FORMAT)?.to_owned(),
            }),
            _ => Err(invalid(raw, Self::FORMAT)),
        }
    }
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// `projectName:notificationType:notificationName`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectNotificationKey {
    pub project_name: String,
    pub notification_type: NotificationKind,
    pub notification_name: String,
}

impl ProjectNotificationKey {
    pub const FORMAT: &'static str = "projectName:notificationType:notificationName";
}

impl FromStr for ProjectNotificationKey {
    type Err = BerthError;

    fn from_str(raw: &str) -> Result<Self> {
        match parts(raw).as_slice() {
            [project, kind, name] => Ok(Self {
                project_name: non_empty(raw, project, Self::FORMAT)?.to_owned(),
                notification_type: kind.parse().map_err(|_| invalid(raw, Self::FORMAT))?,
                notification_name: non_empty(raw, name, Self::FORMAT)?.to_owned(),
            }),
            _ => Err(invalid(raw, Self::FORMAT)),
        }
    }
}

impl fmt::Display for ProjectNotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.project_name, self.notification_type, self.notification_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion_of(err: BerthError) -> Option<String> {
        match err {
            BerthError::Validation { field, suggestion, .. } => {
                assert_eq!(field, "id");
                suggestion
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn variable_keys_with_and_without_environment() {
        let key: VariableKey = "3:44:API_KEY".parse().unwrap();
        assert_eq!(key.project_id, 3);
        assert_eq!(key.environment_id, Some(44));
        assert_eq!(key.name, "API_KEY");
        assert_eq!(key.to_string(), "3:44:API_KEY");

        let key: VariableKey = "3:API_KEY".parse().unwrap();
        assert_eq!(key.environment_id, None);
    }

    #[test]
    fn malformed_variable_key_suggests_format() {
        let err = "API_KEY".parse::<VariableKey>().unwrap_err();
        assert_eq!(suggestion_of(err).as_deref(), Some(VariableKey::FORMAT));

        assert!("x:44:API_KEY".parse::<VariableKey>().is_err());
        assert!("3:44:".parse::<VariableKey>().is_err());
        assert!("3:4:5:6".parse::<VariableKey>().is_err());
    }

    #[test]
    fn environment_key() {
        let key: EnvironmentKey = "7:main".parse().unwrap();
        assert_eq!(key, EnvironmentKey { project_id: 7, name: "main".into() });
        assert!("main".parse::<EnvironmentKey>().is_err());
    }

    #[test]
    fn config_key_requires_two_ids() {
        let key: DeployTargetConfigKey = "7:12".parse().unwrap();
        assert_eq!(key.config_id, 12);
        assert!("7:abc".parse::<DeployTargetConfigKey>().is_err());
        assert!("0:12".parse::<DeployTargetConfigKey>().is_err());
    }

    #[test]
    fn notification_keys_accept_any_case() {
        let key: NotificationKey = "SLACK:deploys".parse().unwrap();
        assert_eq!(key.kind, NotificationKind::Slack);
        assert_eq!(key.to_string(), "slack:deploys");
        assert!("pager:deploys".parse::<NotificationKey>().is_err());
    }

    #[test]
    fn project_notification_key() {
        let key: ProjectNotificationKey = "shop:microsoftteams:alerts".parse().unwrap();
        assert_eq!(key.notification_type, NotificationKind::MicrosoftTeams);
        assert_eq!(key.to_string(), "shop:microsoftteams:alerts");

        let err = "shop:slack".parse::<ProjectNotificationKey>().unwrap_err();
        assert_eq!(suggestion_of(err).as_deref(), Some(ProjectNotificationKey::FORMAT));
    }
}
