//! Project notification link reconciler

use std::sync::Arc;

use berth_core::diff::schema::PROJECT_NOTIFICATION;
use berth_core::diff::DiffSchema;
use berth_core::import_key::ProjectNotificationKey;
use berth_core::normalize;
use berth_domain::{BerthError, DeleteOutcome, ProjectNotification, Result};
use serde_json::json;
use tracing::{info, instrument};

use super::{delete_outcome, Diffable};
use crate::graphql::GraphqlClient;

const ADD_LINK: &str = r"
    mutation AddNotificationToProject($input: ProjectNotificationInput!) {
        addNotificationToProject(input: $input) {
            id
            name
        }
    }
";

const REMOVE_LINK: &str = r"
    mutation RemoveNotificationFromProject($input: ProjectNotificationInput!) {
        removeNotificationFromProject(input: $input) {
            id
            name
        }
    }
";

const PROJECT_LINKS: &str = r"
    query ProjectNotifications($name: String!) {
        projectByName(name: $name) {
            id
            name
            notifications {
                __typename
                ... on NotificationSlack { name }
                ... on NotificationRocketChat { name }
                ... on NotificationEmail { name }
                ... on NotificationMicrosoftTeams { name }
            }
        }
    }
";

/// Links between projects and notifications. There is no update: any
/// change removes the link and adds a new one.
#[derive(Debug, Clone)]
pub struct ProjectNotificationReconciler {
    client: Arc<GraphqlClient>,
}

impl ProjectNotificationReconciler {
    pub fn new(client: Arc<GraphqlClient>) -> Self {
        Self { client }
    }

    #[instrument(skip(self, link), fields(key = %key_of(link)))]
    pub async fn create(&self, link: &ProjectNotification) -> Result<ProjectNotification> {
        if link.project_name.trim().is_empty() {
            return Err(BerthError::validation("projectName", "must not be empty"));
        }
        if link.notification_name.trim().is_empty() {
            return Err(BerthError::validation("notificationName", "must not be empty"));
        }

        let data = self.client.execute(ADD_LINK, json!({ "input": input(link) })).await?;
        let project = normalize::field(&data, "addNotificationToProject")?;
        let project_id = project.get("id").and_then(normalize::relation_id_of);
        info!(?project_id, "linked notification");
        Ok(ProjectNotification { project_id, ..link.clone() })
    }

    /// # Errors
    /// [`BerthError::NotFound`] if the project does not exist or has no such
    /// link.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn read(&self, key: &ProjectNotificationKey) -> Result<ProjectNotification> {
        self.list_for_project(&key.project_name)
            .await?
            .into_iter()
            .find(|link| {
                link.notification_type == key.notification_type
                    && link.notification_name == key.notification_name
            })
            .ok_or_else(|| BerthError::not_found("ProjectNotification", key))
    }

    pub async fn list_for_project(&self, project_name: &str) -> Result<Vec<ProjectNotification>> {
        let data = self.client.execute(PROJECT_LINKS, json!({ "name": project_name })).await?;
        let project = normalize::non_null(&data, "projectByName")?
            .ok_or_else(|| BerthError::not_found("Project", project_name))?;
        normalize::project_notifications(project)
    }

    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn delete(&self, key: &ProjectNotificationKey) -> Result<DeleteOutcome> {
        let link = ProjectNotification {
            project_id: None,
            project_name: key.project_name.clone(),
            notification_type: key.notification_type,
            notification_name: key.notification_name.clone(),
        };
        let result = self.client.execute(REMOVE_LINK, json!({ "input": input(&link) })).await;
        delete_outcome("ProjectNotification", &key.to_string(), result)
    }
}

fn input(link: &ProjectNotification) -> serde_json::Value {
    json!({
        "project": link.project_name,
        "notificationType": link.notification_type.as_wire(),
        "notificationName": link.notification_name,
    })
}

fn key_of(link: &ProjectNotification) -> ProjectNotificationKey {
    ProjectNotificationKey {
        project_name: link.project_name.clone(),
        notification_type: link.notification_type,
        notification_name: link.notification_name.clone(),
    }
}

impl Diffable for ProjectNotificationReconciler {
    type Entity = ProjectNotification;

    const SCHEMA: DiffSchema = PROJECT_NOTIFICATION;
}

#[cfg(test)]
mod tests {
    use berth_domain::{ClientConfig, NotificationKind};
    use serde_json::{Map, Value};

    use super::*;

    fn attributes(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), Value::from(*v))).collect()
    }

    #[test]
    fn every_change_replaces_the_link() {
        let client = GraphqlClient::new(ClientConfig::new("https://api.example.com/graphql")).unwrap();
        let reconciler = ProjectNotificationReconciler::new(Arc::new(client));

        let old = attributes(&[
            ("projectName", "shop"),
            ("notificationType", "slack"),
            ("notificationName", "deploys"),
        ]);
        let new = attributes(&[
            ("projectName", "shop"),
            ("notificationType", "SLACK"),
            ("notificationName", "releases"),
        ]);
        let diff = reconciler.diff(&old, &new);
        assert!(diff.delete_before_replace);
        assert_eq!(diff.replaces().collect::<Vec<_>>(), ["notificationName"]);
    }

    #[test]
    fn key_renders_canonically() {
        let link = ProjectNotification {
            project_id: Some(1),
            project_name: "shop".into(),
            notification_type: NotificationKind::MicrosoftTeams,
            notification_name: "ops".into(),
        };
        assert_eq!(key_of(&link).to_string(), "shop:microsoftteams:ops");
    }
}
