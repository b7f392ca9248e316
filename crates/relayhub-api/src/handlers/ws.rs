//! WebSocket relay endpoint.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use relayhub_core::types::Identity;
use relayhub_realtime::InboundFrame;
use relayhub_realtime::message::router::ReadLoopExit;
use relayhub_realtime::server::{AdmissionError, CLOSE_NORMAL};

use crate::state::AppState;

/// How long the writer may take to flush queued payloads after the session ends.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// GET /ws/{client_id}: WebSocket upgrade
///
/// The credential travels in the configured header. Admission happens after
/// the upgrade so rejections reach the peer as close frames.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let credential = headers
        .get(state.config.relay.auth_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    ws.on_upgrade(move |socket| handle_socket(state, Identity::new(client_id), credential, socket))
}

/// Drives one upgraded socket from admission to teardown.
async fn handle_socket(
    state: AppState,
    identity: Identity,
    credential: Option<String>,
    socket: WebSocket,
) {
    let (session, mut outbound_rx) = match state.hub.admit(identity, credential.as_deref()).await
    {
        Ok(admitted) => admitted,
        Err(e) => {
            reject(socket, &e).await;
            return;
        }
    };

    let identity = session.identity().clone();
    let (mut ws_tx, ws_rx) = socket.split();

    // Sole writer of the socket; hands the sink back once the queue closes.
    let mut writer = tokio::spawn(async move {
        while let Some(payload) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
        ws_tx
    });

    let inbound = Box::pin(ws_rx.filter_map(|result| async move {
        match result {
            Ok(Message::Text(text)) => Some(InboundFrame::Text(text.as_str().to_owned())),
            Ok(Message::Close(_)) => Some(InboundFrame::Closed),
            Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_)) => None,
            Err(e) => Some(InboundFrame::Error(e.to_string())),
        }
    }));

    let exit = session.run(inbound).await;

    match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await {
        Ok(Ok(mut ws_tx)) => {
            let closed = match exit {
                ReadLoopExit::Cancelled => {
                    let frame = CloseFrame {
                        code: CLOSE_NORMAL,
                        reason: "Connection closed by server".into(),
                    };
                    ws_tx.send(Message::Close(Some(frame))).await
                }
                // Flushes the close reply queued when the peer's close arrived.
                ReadLoopExit::PeerClosed => ws_tx.close().await,
                ReadLoopExit::SocketError(_) => Ok(()),
            };
            if let Err(e) = closed {
                debug!(identity = %identity, error = %e, "Close frame not delivered");
            }
        }
        Ok(Err(e)) => warn!(identity = %identity, error = %e, "Socket writer failed"),
        Err(_) => {
            warn!(identity = %identity, "Socket writer did not drain in time");
            writer.abort();
        }
    }
}

/// Closes a rejected socket with the rejection's close code.
async fn reject(mut socket: WebSocket, err: &AdmissionError) {
    info!(error = %err, code = err.close_code(), "Connection rejected");

    let frame = CloseFrame {
        code: err.close_code(),
        reason: err.close_reason().into(),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        debug!(error = %e, "Close frame not delivered");
    }
}
