//! Integration tests for the status and metrics probes.

mod helpers;

use http::StatusCode;

use helpers::{CONTROLLER_KEY, DEVICE_KEY, TestApp};
use relayhub_core::types::Identity;

#[tokio::test]
async fn test_root_reports_running() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Relay hub is running!");
    assert!(response.body["version"].is_string());
}

#[tokio::test]
async fn test_metrics_track_live_connections() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["active_connections"], 0);
    assert_eq!(response.body["pubsub_connections"], 0);

    let (_llm, _llm_rx) = app
        .hub
        .admit(Identity::from("LLM"), Some(CONTROLLER_KEY))
        .await
        .unwrap();
    let (_tv, _tv_rx) = app
        .hub
        .admit(Identity::from("TV"), Some(DEVICE_KEY))
        .await
        .unwrap();
    assert!(app.hub.admit(Identity::from("TV"), Some("nope")).await.is_err());

    let response = app.request("GET", "/metrics").await;
    assert_eq!(response.body["active_connections"], 2);
    assert_eq!(response.body["pubsub_connections"], 2);
    assert_eq!(response.body["connections_total"], 2);
    assert_eq!(response.body["auth_failures"], 1);
}

#[tokio::test]
async fn test_unknown_path_returns_json_404() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
}
