use std::sync::{Arc, Once};
use std::time::Duration;

use berth_domain::{ApiGeneration, ClientConfig};
use berth_infra::GraphqlClient;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub const GRAPHQL_PATH: &str = "/graphql";

static TRACING: Once = Once::new();

/// Install a test subscriber once per binary; honours `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Configuration pointing at `server` with a millisecond backoff.
pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(format!("{}{GRAPHQL_PATH}", server.uri()))
        .with_token("test-token")
        .with_base_backoff(Duration::from_millis(1))
}

pub fn client_for(server: &MockServer, generation: ApiGeneration) -> Arc<GraphqlClient> {
    init_tracing();
    let client = GraphqlClient::new(config_for(server).with_generation(generation))
        .expect("client should build against the mock server");
    Arc::new(client)
}

/// POSTs to the GraphQL endpoint whose body mentions `operation`.
pub fn operation(operation: &str) -> MockBuilder {
    Mock::given(method("POST")).and(path(GRAPHQL_PATH)).and(body_string_contains(operation))
}

pub fn data(payload: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": payload }))
}

pub fn errors(messages: &[&str]) -> ResponseTemplate {
    let errors: Vec<Value> = messages.iter().map(|m| json!({ "message": m })).collect();
    ResponseTemplate::new(200).set_body_json(json!({ "data": null, "errors": errors }))
}
