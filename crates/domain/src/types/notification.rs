//! Alert channels and their project links

use serde::{Deserialize, Serialize};

use crate::errors::{BerthError, Result};
use crate::impl_wire_enum;

/// Alert channel variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Slack,
    RocketChat,
    Email,
    MicrosoftTeams,
}

impl_wire_enum!(NotificationKind {
    Slack => "slack" / "SLACK",
    RocketChat => "rocketchat" / "ROCKETCHAT",
    Email => "email" / "EMAIL",
    MicrosoftTeams => "microsoftteams" / "MICROSOFTTEAMS",
});

impl NotificationKind {
    /// GraphQL object type name, used both as the polymorphic list tag and
    /// as the suffix of the add/update/delete mutations.
    pub const fn typename(self) -> &'static str {
        match self {
            Self::Slack => "NotificationSlack",
            Self::RocketChat => "NotificationRocketChat",
            Self::Email => "NotificationEmail",
            Self::MicrosoftTeams => "NotificationMicrosoftTeams",
        }
    }

    pub fn from_typename(typename: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.typename() == typename)
    }
}

/// Variant-specific settings of a notification.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NotificationPayload {
    Slack { webhook: String, channel: String },
    #[serde(rename = "rocketchat")]
    RocketChat { webhook: String, channel: String },
    Email {
        #[serde(rename = "emailAddress")]
        email_address: String,
    },
    #[serde(rename = "microsoftteams")]
    MicrosoftTeams { webhook: String },
}

impl NotificationPayload {
    pub const fn kind(&self) -> NotificationKind {
        match self {
            Self::Slack { .. } => NotificationKind::Slack,
            Self::RocketChat { .. } => NotificationKind::RocketChat,
            Self::Email { .. } => NotificationKind::Email,
            Self::MicrosoftTeams { .. } => NotificationKind::MicrosoftTeams,
        }
    }
}

impl std::fmt::Debug for NotificationPayload {
    // Webhook URLs embed credentials.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slack { channel, .. } | Self::RocketChat { channel, .. } => f
                .debug_struct(self.kind().typename())
                .field("webhook", &"<redacted>")
                .field("channel", channel)
                .finish(),
            Self::Email { email_address } => {
                f.debug_struct("NotificationEmail").field("email_address", email_address).finish()
            }
            Self::MicrosoftTeams { .. } => f
                .debug_struct("NotificationMicrosoftTeams")
                .field("webhook", &"<redacted>")
                .finish(),
        }
    }
}

/// A named alert channel, independent of projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Option<i64>,
    /// Immutable once created; unique per kind.
    pub name: String,
    pub payload: NotificationPayload,
}

impl Notification {
    pub const fn kind(&self) -> NotificationKind {
        self.payload.kind()
    }

    /// # Errors
    /// Returns [`BerthError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BerthError::validation("name", "must not be empty"));
        }
        match &self.payload {
            NotificationPayload::Slack { webhook, channel }
            | NotificationPayload::RocketChat { webhook, channel } => {
                validate_webhook(webhook)?;
                if channel.trim().is_empty() {
                    return Err(BerthError::validation("channel", "must not be empty"));
                }
            }
            NotificationPayload::Email { email_address } => {
                let valid = email_address
                    .split_once('@')
                    .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
                if !valid {
                    return Err(BerthError::validation(
                        "emailAddress",
                        format!("'{email_address}' is not an email address"),
                    ));
                }
            }
            NotificationPayload::MicrosoftTeams { webhook } => validate_webhook(webhook)?,
        }
        Ok(())
    }
}

fn validate_webhook(webhook: &str) -> Result<()> {
    if webhook.starts_with("https://") || webhook.starts_with("http://") {
        Ok(())
    } else {
        Err(BerthError::validation("webhook", "must be an http(s) URL"))
    }
}

/// Link between a project and a notification.
///
/// The remote offers only add-link and remove-link, so every field is
/// identity: any change replaces the link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNotification {
    /// Remote id of the project, filled in by reads.
    pub project_id: Option<i64>,
    pub project_name: String,
    pub notification_type: NotificationKind,
    pub notification_name: String,
}
