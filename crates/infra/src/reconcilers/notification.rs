//! Notification reconcilers
//!
//! One reconciler instance per variant. Mutations are named after the
//! variant's GraphQL type (`addNotificationSlack`, `updateNotificationEmail`,
//! ...); reads go through the single polymorphic `allNotifications` list.

use std::sync::Arc;

use berth_core::diff::schema::NOTIFICATION;
use berth_core::diff::DiffSchema;
use berth_core::import_key::NotificationKey;
use berth_core::normalize;
use berth_domain::{
    BerthError, DeleteOutcome, Notification, NotificationKind, NotificationPayload, Result,
};
use serde_json::{json, Map, Value};
use tracing::{info, instrument};

use super::{delete_outcome, Diffable};
use crate::graphql::GraphqlClient;

const ALL_NOTIFICATIONS: &str = r"
    query AllNotifications {
        allNotifications {
            __typename
            ... on NotificationSlack { id name webhook channel }
            ... on NotificationRocketChat { id name webhook channel }
            ... on NotificationEmail { id name emailAddress }
            ... on NotificationMicrosoftTeams { id name webhook }
        }
    }
";

#[derive(Debug, Clone)]
pub struct NotificationReconciler {
    client: Arc<GraphqlClient>,
    kind: NotificationKind,
}

impl NotificationReconciler {
    pub fn new(client: Arc<GraphqlClient>, kind: NotificationKind) -> Self {
        Self { client, kind }
    }

    pub fn slack(client: Arc<GraphqlClient>) -> Self {
        Self::new(client, NotificationKind::Slack)
    }

    pub fn rocket_chat(client: Arc<GraphqlClient>) -> Self {
        Self::new(client, NotificationKind::RocketChat)
    }

    pub fn email(client: Arc<GraphqlClient>) -> Self {
        Self::new(client, NotificationKind::Email)
    }

    pub fn microsoft_teams(client: Arc<GraphqlClient>) -> Self {
        Self::new(client, NotificationKind::MicrosoftTeams)
    }

    pub const fn kind(&self) -> NotificationKind {
        self.kind
    }

    /// # Errors
    /// Validation errors, including a payload of another variant, before any
    /// call; otherwise the client's errors.
    #[instrument(skip(self, notification), fields(kind = %self.kind, name = %notification.name))]
    pub async fn create(&self, notification: &Notification) -> Result<Notification> {
        self.check_kind(notification)?;
        notification.validate()?;

        let mut input = payload_fields(&notification.payload);
        input.insert("name".into(), Value::from(notification.name.clone()));
        let typename = self.kind.typename();
        let query = format!(
            "mutation Add{typename}($input: Add{typename}Input!) {{ add{typename}(input: $input) {{ {} }} }}",
            selection(self.kind)
        );

        let data = self.client.execute(&query, json!({ "input": input })).await?;
        let created =
            normalize::notification(normalize::field(&data, &format!("add{typename}"))?, self.kind)?;
        info!(id = ?created.id, "created notification");
        Ok(created)
    }

    /// # Errors
    /// `NotFound` with the variant's type name as kind if no notification of
    /// this variant has that name.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn read(&self, name: &str) -> Result<Notification> {
        self.list()
            .await?
            .into_iter()
            .find(|notification| notification.name == name)
            .ok_or_else(|| BerthError::not_found(self.kind.typename(), name))
    }

    /// Read through an import key, which must name this reconciler's
    /// variant.
    pub async fn import(&self, key: &NotificationKey) -> Result<Notification> {
        if key.kind != self.kind {
            return Err(BerthError::validation(
                "id",
                format!("'{key}' is not a {} notification", self.kind),
            )
            .with_suggestion(format!("{}:{}", self.kind, key.name)));
        }
        self.read(&key.name).await
    }

    /// Notifications of this variant.
    pub async fn list(&self) -> Result<Vec<Notification>> {
        let kind = self.kind;
        Ok(list_all(&self.client)
            .await?
            .into_iter()
            .filter(|notification| notification.kind() == kind)
            .collect())
    }

    /// Replace the payload of notification `name`. The name itself is
    /// immutable.
    #[instrument(skip(self, payload), fields(kind = %self.kind))]
    pub async fn update(&self, name: &str, payload: &NotificationPayload) -> Result<Notification> {
        if payload.kind() != self.kind {
            return Err(mismatch(self.kind, payload.kind()));
        }
        Notification { id: None, name: name.to_owned(), payload: payload.clone() }.validate()?;

        let typename = self.kind.typename();
        let query = format!(
            "mutation Update{typename}($input: Update{typename}Input!) {{ update{typename}(input: $input) {{ {} }} }}",
            selection(self.kind)
        );
        let input = json!({ "name": name, "patch": payload_fields(payload) });
        let data = self.client.execute(&query, json!({ "input": input })).await?;
        normalize::notification(normalize::field(&data, &format!("update{typename}"))?, self.kind)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn delete(&self, name: &str) -> Result<DeleteOutcome> {
        let typename = self.kind.typename();
        let query = format!(
            "mutation Delete{typename}($input: Delete{typename}Input!) {{ delete{typename}(input: $input) }}"
        );
        let result = self.client.execute(&query, json!({ "input": { "name": name } })).await;
        delete_outcome(typename, name, result)
    }

    fn check_kind(&self, notification: &Notification) -> Result<()> {
        if notification.kind() == self.kind {
            Ok(())
        } else {
            Err(mismatch(self.kind, notification.kind()))
        }
    }
}

/// Every notification of every supported variant; unknown variants in the
/// list are skipped.
pub async fn list_all(client: &GraphqlClient) -> Result<Vec<Notification>> {
    let data = client.execute(ALL_NOTIFICATIONS, json!({})).await?;
    let tagged = normalize::list(
        normalize::field(&data, "allNotifications")?,
        normalize::tagged_notification,
    )?;
    Ok(tagged.into_iter().flatten().collect())
}

fn mismatch(expected: NotificationKind, actual: NotificationKind) -> BerthError {
    BerthError::validation("kind", format!("expected a {expected} payload, got {actual}"))
        .with_suggestion(expected.as_str())
}

const fn selection(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Slack | NotificationKind::RocketChat => "id name webhook channel",
        NotificationKind::Email => "id name emailAddress",
        NotificationKind::MicrosoftTeams => "id name webhook",
    }
}

fn payload_fields(payload: &NotificationPayload) -> Map<String, Value> {
    let mut fields = Map::new();
    match payload {
        NotificationPayload::Slack { webhook, channel }
        | NotificationPayload::RocketChat { webhook, channel } => {
            fields.insert("webhook".into(), Value::from(webhook.clone()));
            fields.insert("channel".into(), Value::from(channel.clone()));
        }
        NotificationPayload::Email { email_address } => {
            fields.insert("emailAddress".into(), Value::from(email_address.clone()));
        }
        NotificationPayload::MicrosoftTeams { webhook } => {
            fields.insert("webhook".into(), Value::from(webhook.clone()));
        }
    }
    fields
}

impl Diffable for NotificationReconciler {
    type Entity = Notification;

    const SCHEMA: DiffSchema = NOTIFICATION;

    /// Payload members are compared as top-level attributes next to `name`
    /// and `kind`.
    fn attributes(entity: &Notification) -> Result<Map<String, Value>> {
        let mut attributes = payload_fields(&entity.payload);
        attributes.insert("name".into(), Value::from(entity.name.clone()));
        attributes.insert("kind".into(), Value::from(entity.kind().as_str()));
        if let Some(id) = entity.id {
            attributes.insert("id".into(), Value::from(id));
        }
        Ok(attributes)
    }
}
