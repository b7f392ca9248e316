//! Message router: the per-connection read loop.
//!
//! The sender's role is fixed at admission. Controller frames are JSON
//! commands addressed to a device; device frames are opaque text wrapped
//! into an event for the controller.

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use relayhub_core::result::AppResult;
use relayhub_core::traits::transport::PubSubTransport;
use relayhub_core::types::{Identity, Role};

use crate::metrics::RelayMetrics;

use super::envelope::{ControllerCommand, DeviceEvent};
use super::frame::InboundFrame;

/// Notice sent back to the controller when a frame is not JSON.
pub const INVALID_JSON_NOTICE: &str = "Invalid JSON format.";

/// Notice sent back to the controller when `target` or `message` is missing.
pub const MISSING_FIELDS_NOTICE: &str = "Invalid JSON. Need 'target' and 'message'";

/// What a routed frame turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Controller command for a device.
    Command,
    /// Device event for the controller.
    Event,
    /// Malformed controller frame, answered on the controller's own channel.
    Notice,
}

/// A single publish decided by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    /// Channel to publish to.
    pub channel: String,
    /// Payload to publish.
    pub payload: String,
    /// How the frame was classified.
    pub kind: RouteKind,
}

/// Why a read loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLoopExit {
    /// The peer closed the connection or the stream ended.
    PeerClosed,
    /// The session was cancelled from outside (bridge exit, shutdown).
    Cancelled,
    /// The socket failed.
    SocketError(String),
}

/// Routes frames from one connection.
#[derive(Debug, Clone)]
pub struct MessageRouter {
    identity: Identity,
    role: Role,
    controller: Identity,
}

impl MessageRouter {
    /// Creates a router for `identity`; its role follows from `controller`.
    pub fn new(identity: Identity, controller: Identity) -> Self {
        let role = Role::of(&identity, &controller);
        Self {
            identity,
            role,
            controller,
        }
    }

    /// Identity whose frames this router handles.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Role of that identity.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Decides where one text frame goes and what is published.
    pub fn route(&self, frame: &str) -> AppResult<Routed> {
        match self.role {
            Role::Controller => Ok(self.route_command(frame)),
            Role::Device => self.route_event(frame),
        }
    }

    fn route_command(&self, frame: &str) -> Routed {
        let value = match serde_json::from_str::<serde_json::Value>(frame) {
            Ok(value) => value,
            Err(_) => return self.notice(INVALID_JSON_NOTICE),
        };

        match ControllerCommand::from_value(&value) {
            Some(command) => Routed {
                channel: command.target.channel().to_string(),
                payload: command.message,
                kind: RouteKind::Command,
            },
            None => self.notice(MISSING_FIELDS_NOTICE),
        }
    }

    fn route_event(&self, frame: &str) -> AppResult<Routed> {
        let event = DeviceEvent {
            sender: self.identity.clone(),
            message: frame.to_string(),
        };

        Ok(Routed {
            channel: self.controller.channel().to_string(),
            payload: serde_json::to_string(&event)?,
            kind: RouteKind::Event,
        })
    }

    fn notice(&self, notice: &str) -> Routed {
        Routed {
            channel: self.controller.channel().to_string(),
            payload: notice.to_string(),
            kind: RouteKind::Notice,
        }
    }

    /// Reads frames until the peer leaves or `cancel` fires, publishing
    /// each routed frame.
    ///
    /// Malformed controller frames and failed publishes are logged and the
    /// loop carries on; only the connection itself ends it.
    pub async fn run<S>(
        &self,
        inbound: &mut S,
        transport: &dyn PubSubTransport,
        metrics: &RelayMetrics,
        cancel: &CancellationToken,
    ) -> ReadLoopExit
    where
        S: Stream<Item = InboundFrame> + Unpin + Send,
    {
        loop {
            let frame = tokio::select! {
                biased;
                _ = cancel.cancelled() => return ReadLoopExit::Cancelled,
                frame = inbound.next() => frame,
            };

            let text = match frame {
                Some(InboundFrame::Text(text)) => text,
                Some(InboundFrame::Closed) | None => return ReadLoopExit::PeerClosed,
                Some(InboundFrame::Error(e)) => return ReadLoopExit::SocketError(e),
            };

            let routed = match self.route(&text) {
                Ok(routed) => routed,
                Err(e) => {
                    error!(identity = %self.identity, error = %e, "Failed to route frame");
                    continue;
                }
            };

            if routed.kind == RouteKind::Notice {
                metrics.malformed_frame();
            }

            debug!(
                identity = %self.identity,
                channel = %routed.channel,
                kind = ?routed.kind,
                "Publishing frame"
            );

            match transport.publish(&routed.channel, &routed.payload).await {
                Ok(_) => metrics.message_published(),
                Err(e) => {
                    error!(
                        identity = %self.identity,
                        channel = %routed.channel,
                        error = %e,
                        "Publish failed, message dropped"
                    );
                }
            }
        }
    }
}
