//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use futures::{SinkExt, StreamExt};
use http::{Request, StatusCode};
use secrecy::SecretString;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use relayhub_api::{AppState, build_router};
use relayhub_core::config::AppConfig;
use relayhub_core::config::pubsub::PubSubProvider;
use relayhub_core::types::Identity;
use relayhub_realtime::RelayHub;
use relayhub_realtime::bridge::build_transport;

/// Controller credential used by every test.
pub const CONTROLLER_KEY: &str = "test-llm-key";
/// Device credential used by every test.
pub const DEVICE_KEY: &str = "test-unity-key";
/// Controller identity.
pub const CONTROLLER: &str = "LLM";

const TIMEOUT: Duration = Duration::from_secs(2);

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Relay engine behind the router
    pub hub: RelayHub,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create a new test application on the in-memory transport
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.relay.controller_id = CONTROLLER.to_string();
        config.relay.controller_secret = Some(SecretString::new(CONTROLLER_KEY.to_string()));
        config.relay.device_secret = Some(SecretString::new(DEVICE_KEY.to_string()));
        config.pubsub.provider = PubSubProvider::Memory;
        config.validate().expect("Test config is invalid");

        let transport = build_transport(&config.pubsub)
            .await
            .expect("Failed to build transport");
        let hub = RelayHub::from_config(&config.relay, transport).expect("Failed to build hub");
        let router = build_router(AppState::new(config.clone(), hub.clone()));

        Self {
            router,
            hub,
            config,
        }
    }

    /// Make an HTTP request to the test app
    pub async fn request(&self, method: &str, path: &str) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Serve the app on an ephemeral local port
    pub async fn spawn(self) -> TestServer {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local address");

        let router = self.router.clone();
        let server = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Test server failed");
        });

        TestServer {
            addr,
            hub: self.hub,
            server,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

/// A relay server listening on a real socket.
pub struct TestServer {
    /// Listening address
    pub addr: SocketAddr,
    /// Relay engine
    pub hub: RelayHub,
    server: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl TestServer {
    /// Open a WebSocket as `client_id`, sending `key` in the auth header when given.
    pub async fn connect(&self, client_id: &str, key: Option<&str>) -> WsClient {
        let mut request = format!("ws://{}/ws/{}", self.addr, client_id)
            .into_client_request()
            .expect("Invalid ws url");

        if let Some(key) = key {
            request.headers_mut().insert(
                "x-auth-token",
                HeaderValue::from_str(key).expect("Invalid header value"),
            );
        }

        let (stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .expect("WebSocket handshake failed");

        WsClient { stream }
    }

    /// Connect and wait until admission, bridge included, has completed.
    pub async fn connect_admitted(&self, client_id: &str, key: &str) -> WsClient {
        let admitted = self.hub.status().connections_total;
        let client = self.connect(client_id, Some(key)).await;
        self.wait_until(|hub| {
            hub.status().connections_total > admitted
                && hub.registry().contains(&Identity::from(client_id))
        })
        .await;
        client
    }

    /// Poll until `condition` holds for the hub.
    pub async fn wait_until(&self, condition: impl Fn(&RelayHub) -> bool) {
        tokio::time::timeout(TIMEOUT, async {
            while !condition(&self.hub) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Condition not reached in time");
    }
}

/// Client side of a relay connection.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Send one text frame.
    pub async fn send_text(&mut self, text: &str) {
        self.stream
            .send(Message::text(text))
            .await
            .expect("Failed to send frame");
    }

    /// Next text frame, skipping control frames.
    pub async fn recv_text(&mut self) -> String {
        loop {
            let msg = tokio::time::timeout(TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for a text frame")
                .expect("Stream ended")
                .expect("Socket error");

            match msg {
                Message::Text(text) => return text.as_str().to_owned(),
                Message::Close(frame) => panic!("Connection closed: {frame:?}"),
                _ => continue,
            }
        }
    }

    /// Next text frame parsed as JSON.
    pub async fn recv_json(&mut self) -> Value {
        let text = self.recv_text().await;
        serde_json::from_str(&text).expect("Frame is not JSON")
    }

    /// Waits for the server's close frame and returns its code.
    pub async fn recv_close_code(&mut self) -> Option<u16> {
        loop {
            let next = tokio::time::timeout(TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for close");

            match next {
                Some(Ok(Message::Close(frame))) => return frame.map(|f| u16::from(f.code)),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return None,
            }
        }
    }

    /// Asserts nothing arrives for a short while.
    pub async fn expect_silence(&mut self) {
        if let Ok(Some(Ok(Message::Text(text)))) =
            tokio::time::timeout(Duration::from_millis(150), self.stream.next()).await
        {
            panic!("Unexpected frame: {text}");
        }
    }

    /// Closes the connection from the client side.
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }

    /// Starts a normal close and returns the code the server answers with.
    pub async fn close_and_await_reply(mut self) -> Option<u16> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "bye".into(),
        };
        self.stream
            .close(Some(frame))
            .await
            .expect("Failed to send close");
        self.recv_close_code().await
    }
}
