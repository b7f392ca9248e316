//! Integration tests for WebSocket admission and relaying.

mod helpers;

use serde_json::json;

use helpers::{CONTROLLER, CONTROLLER_KEY, DEVICE_KEY, TestApp};
use relayhub_core::types::Identity;

#[tokio::test]
async fn test_wrong_credential_closed_with_policy_violation() {
    let server = TestApp::new().await.spawn().await;

    let mut client = server.connect("TV", Some("wrong")).await;
    assert_eq!(client.recv_close_code().await, Some(1008));

    // A device key never admits the controller identity.
    let mut client = server.connect(CONTROLLER, Some(DEVICE_KEY)).await;
    assert_eq!(client.recv_close_code().await, Some(1008));

    let mut client = server.connect("TV", None).await;
    assert_eq!(client.recv_close_code().await, Some(1008));

    assert!(server.hub.registry().is_empty());
    assert_eq!(server.hub.status().auth_failures, 3);
    assert_eq!(server.hub.status().pubsub_connections, 0);
}

#[tokio::test]
async fn test_duplicate_identity_closed_normally() {
    let server = TestApp::new().await.spawn().await;
    let mut llm = server.connect_admitted(CONTROLLER, CONTROLLER_KEY).await;
    let mut tv = server.connect_admitted("TV", DEVICE_KEY).await;

    let mut second = server.connect("TV", Some(DEVICE_KEY)).await;
    assert_eq!(second.recv_close_code().await, Some(1000));

    // The first connection keeps working.
    llm.send_text(r#"{"target": "TV", "message": "on"}"#).await;
    assert_eq!(tv.recv_text().await, "on");
    assert_eq!(server.hub.status().duplicate_rejections, 1);
}

#[tokio::test]
async fn test_controller_command_reaches_only_target() {
    let server = TestApp::new().await.spawn().await;
    let mut llm = server.connect_admitted(CONTROLLER, CONTROLLER_KEY).await;
    let mut dev1 = server.connect_admitted("dev1", DEVICE_KEY).await;
    let mut dev2 = server.connect_admitted("dev2", DEVICE_KEY).await;

    llm.send_text(r#"{"target": "dev1", "message": "on"}"#).await;

    assert_eq!(dev1.recv_text().await, "on");
    dev2.expect_silence().await;
    llm.expect_silence().await;
}

#[tokio::test]
async fn test_device_event_reaches_controller() {
    let server = TestApp::new().await.spawn().await;
    let mut llm = server.connect_admitted(CONTROLLER, CONTROLLER_KEY).await;
    let mut dev1 = server.connect_admitted("dev1", DEVICE_KEY).await;

    dev1.send_text("hello").await;

    assert_eq!(
        llm.recv_json().await,
        json!({"sender": "dev1", "message": "hello"})
    );
}

#[tokio::test]
async fn test_malformed_command_answered_then_session_continues() {
    let server = TestApp::new().await.spawn().await;
    let mut llm = server.connect_admitted(CONTROLLER, CONTROLLER_KEY).await;
    let mut dev1 = server.connect_admitted("dev1", DEVICE_KEY).await;

    llm.send_text("{not json").await;
    assert_eq!(llm.recv_text().await, "Invalid JSON format.");

    llm.send_text(r#"{"target": "dev1"}"#).await;
    assert_eq!(
        llm.recv_text().await,
        "Invalid JSON. Need 'target' and 'message'"
    );

    llm.send_text(r#"{"target": "dev1", "message": "off"}"#).await;
    assert_eq!(dev1.recv_text().await, "off");
}

#[tokio::test]
async fn test_command_to_absent_device_is_dropped() {
    let server = TestApp::new().await.spawn().await;
    let mut llm = server.connect_admitted(CONTROLLER, CONTROLLER_KEY).await;

    llm.send_text(r#"{"target": "ghost", "message": "on"}"#).await;
    llm.expect_silence().await;

    let mut ghost = server.connect_admitted("ghost", DEVICE_KEY).await;
    ghost.expect_silence().await;

    llm.send_text(r#"{"target": "ghost", "message": "on"}"#).await;
    assert_eq!(ghost.recv_text().await, "on");
}

#[tokio::test]
async fn test_disconnect_releases_identity_and_subscription() {
    let server = TestApp::new().await.spawn().await;
    let mut llm = server.connect_admitted(CONTROLLER, CONTROLLER_KEY).await;
    let dev1 = server.connect_admitted("dev1", DEVICE_KEY).await;
    assert_eq!(server.hub.status().pubsub_connections, 2);

    dev1.close().await;
    server
        .wait_until(|hub| !hub.registry().contains(&Identity::from("dev1")))
        .await;
    server
        .wait_until(|hub| hub.status().pubsub_connections == 1)
        .await;

    // The identity is free again.
    let mut dev1 = server.connect_admitted("dev1", DEVICE_KEY).await;
    llm.send_text(r#"{"target": "dev1", "message": "again"}"#).await;
    assert_eq!(dev1.recv_text().await, "again");
}

#[tokio::test]
async fn test_client_close_is_answered_with_close_frame() {
    let server = TestApp::new().await.spawn().await;
    let dev1 = server.connect_admitted("dev1", DEVICE_KEY).await;

    assert_eq!(dev1.close_and_await_reply().await, Some(1000));
    server
        .wait_until(|hub| !hub.registry().contains(&Identity::from("dev1")))
        .await;
}

#[tokio::test]
async fn test_shutdown_closes_live_connections() {
    let server = TestApp::new().await.spawn().await;
    let mut dev1 = server.connect_admitted("dev1", DEVICE_KEY).await;

    server.hub.shutdown();

    assert_eq!(dev1.recv_close_code().await, Some(1000));
    server
        .wait_until(|hub| hub.status().pubsub_connections == 0)
        .await;
}
