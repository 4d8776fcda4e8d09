//! Integration tests for resource reconcilers over HTTP
//!
//! **Coverage:**
//! - Variable dual-path fallback on schema-mismatch errors
//! - Fetch-all-then-filter NotFound for deploy targets
//! - Project create/read and delete of an already removed project
//! - Polymorphic notification listing

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use berth_core::import_key::VariableKey;
use berth_domain::{
    ApiGeneration, BerthError, DeleteOutcome, NotificationPayload, Project, Variable,
    VariableScope,
};
use berth_infra::{
    DeployTargetReconciler, NotificationReconciler, ProjectReconciler, VariableReconciler,
};
use serde_json::json;
use support::{client_for, data, errors, operation};
use wiremock::matchers::body_string_contains;
use wiremock::MockServer;

fn api_key() -> Variable {
    Variable {
        name: "API_KEY".into(),
        value: "s3cret".into(),
        scope: VariableScope::Runtime,
        project_id: 7,
        environment_id: Some(9),
        ..Default::default()
    }
}

#[tokio::test]
async fn variable_falls_back_to_legacy_on_unknown_argument() {
    let server = MockServer::start().await;
    operation("EnvironmentNames")
        .respond_with(data(json!({
            "environmentById": { "id": 9, "name": "main", "project": { "id": 7, "name": "shop" } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    operation("AddOrUpdateEnvVariableByName")
        .respond_with(errors(&[
            "Unknown argument \"environment\" on field \"addOrUpdateEnvVariableByName\" of type \"Mutation\".",
        ]))
        .expect(1)
        .mount(&server)
        .await;
    operation("AddEnvVariable")
        .and(body_string_contains("\"typeId\":9"))
        .and(body_string_contains("\"type\":\"ENVIRONMENT\""))
        .respond_with(data(json!({
            "addEnvVariable": { "id": 55, "name": "API_KEY", "value": "s3cret", "scope": "RUNTIME" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = VariableReconciler::new(client_for(&server, ApiGeneration::Current));
    let saved = reconciler.create(&api_key()).await.unwrap();

    assert_eq!(saved.id, Some(55));
    assert_eq!(saved.scope, VariableScope::Runtime);
    assert_eq!(saved.environment_id, Some(9));
}

#[tokio::test]
async fn variable_business_errors_do_not_fall_back() {
    let server = MockServer::start().await;
    operation("EnvironmentNames")
        .respond_with(data(json!({
            "environmentById": { "id": 9, "name": "main", "project": { "id": 7, "name": "shop" } }
        })))
        .mount(&server)
        .await;
    operation("AddOrUpdateEnvVariableByName")
        .respond_with(errors(&["Unauthorized: You don't have permission to \"add:production\""]))
        .expect(1)
        .mount(&server)
        .await;
    operation("AddEnvVariable").respond_with(data(json!({}))).expect(0).mount(&server).await;

    let reconciler = VariableReconciler::new(client_for(&server, ApiGeneration::Current));
    let err = reconciler.create(&api_key()).await.unwrap_err();
    assert!(matches!(err, BerthError::Api(message) if message.starts_with("Unauthorized")));
}

#[tokio::test]
async fn variable_read_by_import_key_on_current_schema() {
    let server = MockServer::start().await;
    operation("AllProjectNames")
        .respond_with(data(json!({ "allProjects": [{ "id": 7, "name": "shop" }] })))
        .mount(&server)
        .await;
    operation("EnvVariablesByProjectEnvironmentName")
        .and(body_string_contains("\"project\":\"shop\""))
        .respond_with(data(json!({
            "getEnvVariablesByProjectEnvironmentName": [
                { "id": 1, "name": "OTHER", "value": "x", "scope": "global" },
                { "id": 2, "name": "API_KEY", "value": "s3cret", "scope": "CONTAINER_REGISTRY" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let key: VariableKey = "7:API_KEY".parse().unwrap();
    let reconciler = VariableReconciler::new(client_for(&server, ApiGeneration::Current));
    let variable = reconciler.read(&key).await.unwrap();

    assert_eq!(variable.id, Some(2));
    assert_eq!(variable.scope, VariableScope::Registry);
    assert_eq!(variable.environment_id, None);
}

#[tokio::test]
async fn absent_deploy_target_is_not_found() {
    let server = MockServer::start().await;
    operation("AllKubernetes")
        .respond_with(data(json!({
            "allKubernetes": [
                { "id": 1, "name": "eu-west", "consoleUrl": "https://k8s-eu.example.com" },
                { "id": 2, "name": "us-east", "consoleUrl": "https://k8s-us.example.com", "disabled": 1 }
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let reconciler = DeployTargetReconciler::new(client_for(&server, ApiGeneration::Legacy));
    let err = reconciler.read(99).await.unwrap_err();
    assert_eq!(err, BerthError::NotFound { kind: "DeployTarget".into(), key: "99".into() });

    let target = reconciler.read(2).await.unwrap();
    assert_eq!(target.name, "us-east");
    assert!(target.disabled);
}

#[tokio::test]
async fn project_create_then_read_missing() {
    let server = MockServer::start().await;
    operation("AddProject")
        .and(body_string_contains("\"autoIdle\":1"))
        .respond_with(data(json!({
            "addProject": {
                "id": 12,
                "name": "shop",
                "gitUrl": "git@example.com:acme/shop.git",
                "productionEnvironment": "main",
                "autoIdle": 1,
                "kubernetes": { "id": 1, "name": "eu-west" },
                "created": "2026-10-19 08:00:00"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    operation("ProjectByName")
        .respond_with(data(json!({ "projectByName": null })))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = ProjectReconciler::new(client_for(&server, ApiGeneration::Current));
    let created = reconciler
        .create(&Project {
            name: "shop".into(),
            git_url: "git@example.com:acme/shop.git".into(),
            deploy_target_id: 1,
            production_environment: "main".into(),
            auto_idle: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.id, Some(12));
    assert_eq!(created.deploy_target_id, 1);
    assert_eq!(created.auto_idle, Some(true));

    let err = reconciler.read("nope").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn deleting_a_removed_project_is_already_gone() {
    let server = MockServer::start().await;
    operation("DeleteProject")
        .respond_with(errors(&["Project 'shop' not found"]))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = ProjectReconciler::new(client_for(&server, ApiGeneration::Current));
    assert_eq!(reconciler.delete("shop").await, Ok(DeleteOutcome::AlreadyGone));
}

#[tokio::test]
async fn notifications_are_filtered_by_variant() {
    let server = MockServer::start().await;
    operation("AllNotifications")
        .respond_with(data(json!({
            "allNotifications": [
                { "__typename": "NotificationSlack", "id": 1, "name": "deploys",
                  "webhook": "https://hooks.example.com/a", "channel": "#deploys" },
                { "__typename": "NotificationEmail", "id": 2, "name": "ops",
                  "emailAddress": "ops@example.com" },
                { "__typename": "NotificationWebhook", "id": 3, "name": "legacy-hook" }
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, ApiGeneration::Current);
    let slack = NotificationReconciler::slack(client.clone());
    let all = slack.list().await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(matches!(&all[0].payload, NotificationPayload::Slack { channel, .. } if channel == "#deploys"));

    let err = NotificationReconciler::email(client).read("deploys").await.unwrap_err();
    assert_eq!(err, BerthError::not_found("NotificationEmail", "deploys"));
}
