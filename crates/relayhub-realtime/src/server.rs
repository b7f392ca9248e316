//! Top-level relay hub that ties admission, bridging, routing and cleanup together.

use std::sync::Arc;

use chrono::Utc;
use futures::Stream;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use relayhub_core::config::relay::RelayConfig;
use relayhub_core::error::AppError;
use relayhub_core::traits::transport::PubSubTransport;
use relayhub_core::types::{Identity, Role};

use crate::bridge::channel_bridge::{BridgeExit, ChannelBridge};
use crate::connection::authenticator::IdentityGate;
use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::registry::{AlreadyConnected, ConnectionRegistry};
use crate::message::frame::InboundFrame;
use crate::message::router::{MessageRouter, ReadLoopExit};
use crate::metrics::{MetricsSnapshot, RelayMetrics};

/// WebSocket close code for a normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// WebSocket close code for a policy violation.
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;
/// WebSocket close code for an internal server error.
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

/// Why a connection attempt was turned away.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Wrong or missing credential for the claimed identity.
    #[error("unauthorized connection attempt for '{0}'")]
    Unauthorized(Identity),
    /// The identity already has a live connection.
    #[error(transparent)]
    AlreadyConnected(#[from] AlreadyConnected),
    /// The identity's channel could not be subscribed.
    #[error("transport unavailable: {0}")]
    Transport(#[source] AppError),
}

impl AdmissionError {
    /// Close code the connection must be closed with.
    pub fn close_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => CLOSE_POLICY_VIOLATION,
            Self::AlreadyConnected(_) => CLOSE_NORMAL,
            Self::Transport(_) => CLOSE_INTERNAL_ERROR,
        }
    }

    /// Short close reason for the peer.
    pub fn close_reason(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "Unauthorized",
            Self::AlreadyConnected(_) => "Already connected",
            Self::Transport(_) => "Transport unavailable",
        }
    }
}

/// Central relay engine. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct RelayHub {
    /// Identity gate.
    gate: Arc<IdentityGate>,
    /// Connection registry.
    registry: Arc<ConnectionRegistry>,
    /// Pub/sub transport.
    transport: Arc<dyn PubSubTransport>,
    /// Metrics collector.
    metrics: Arc<RelayMetrics>,
    /// Outbound queue capacity per connection.
    outbound_buffer_size: usize,
}

impl std::fmt::Debug for RelayHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayHub")
            .field("controller", self.gate.controller())
            .field("connections", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl RelayHub {
    /// Creates a hub with its own, empty registry.
    pub fn new(
        gate: IdentityGate,
        transport: Arc<dyn PubSubTransport>,
        outbound_buffer_size: usize,
    ) -> Self {
        Self {
            gate: Arc::new(gate),
            registry: Arc::new(ConnectionRegistry::new()),
            transport,
            metrics: Arc::new(RelayMetrics::new()),
            outbound_buffer_size: outbound_buffer_size.max(1),
        }
    }

    /// Creates a hub from relay configuration.
    pub fn from_config(
        config: &RelayConfig,
        transport: Arc<dyn PubSubTransport>,
    ) -> Result<Self, AppError> {
        let gate = IdentityGate::from_config(config)?;
        info!(controller = %gate.controller(), "Relay hub initialized");
        Ok(Self::new(gate, transport, config.outbound_buffer_size))
    }

    /// Admits a connection attempt: authorize, register, subscribe.
    ///
    /// On success the identity is registered, its bridge is running, and
    /// the returned receiver yields every payload destined for the socket.
    pub async fn admit(
        &self,
        identity: Identity,
        credential: Option<&str>,
    ) -> Result<(RelaySession, mpsc::Receiver<String>), AdmissionError> {
        if !self.gate.authorize(&identity, credential) {
            self.metrics.auth_failed();
            return Err(AdmissionError::Unauthorized(identity));
        }

        let role = self.gate.role_of(&identity);
        let (tx, rx) = mpsc::channel(self.outbound_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(identity.clone(), role, tx));
        let cancel = CancellationToken::new();

        if let Err(e) = self.registry.register(Arc::clone(&handle), cancel.clone()) {
            warn!(identity = %identity, "Client ID is already connected");
            self.metrics.duplicate_rejected();
            return Err(e.into());
        }

        let bridge = match ChannelBridge::open(
            self.transport.as_ref(),
            identity.clone(),
            handle.id,
            Arc::clone(&self.registry),
            Arc::clone(&self.metrics),
            cancel.clone(),
        )
        .await
        {
            Ok(bridge) => bridge,
            Err(e) => {
                self.registry.deregister_connection(&identity, handle.id);
                return Err(AdmissionError::Transport(e));
            }
        };

        let bridge_task = bridge.spawn();
        self.metrics.connection_admitted();

        info!(identity = %identity, role = %role, conn_id = %handle.id, "Client connected");

        let session = RelaySession {
            router: MessageRouter::new(identity, self.gate.controller().clone()),
            handle,
            bridge_task: Some(bridge_task),
            cancel,
            registry: Arc::clone(&self.registry),
            transport: Arc::clone(&self.transport),
            metrics: Arc::clone(&self.metrics),
        };

        Ok((session, rx))
    }

    /// Returns the connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Returns the controller identity.
    pub fn controller(&self) -> &Identity {
        self.gate.controller()
    }

    /// Current counts for the status probe.
    pub fn status(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.registry.len())
    }

    /// Deregisters every connection; their sessions then wind down.
    pub fn shutdown(&self) {
        let closed = self.registry.clear();
        info!(count = closed, "All connections closed");
    }
}

/// Lifecycle of one admitted connection.
///
/// Owns the bridge task and the cancellation token shared with the
/// registry entry; [`run`](Self::run) always ends in teardown. A session
/// dropped without running still releases its identity and stops its bridge.
#[derive(Debug)]
pub struct RelaySession {
    router: MessageRouter,
    handle: Arc<ConnectionHandle>,
    bridge_task: Option<JoinHandle<BridgeExit>>,
    cancel: CancellationToken,
    registry: Arc<ConnectionRegistry>,
    transport: Arc<dyn PubSubTransport>,
    metrics: Arc<RelayMetrics>,
}

impl RelaySession {
    /// Identity of the connection.
    pub fn identity(&self) -> &Identity {
        self.router.identity()
    }

    /// Role of the connection.
    pub fn role(&self) -> Role {
        self.router.role()
    }

    /// Unique connection ID.
    pub fn connection_id(&self) -> ConnectionId {
        self.handle.id
    }

    /// Runs the read loop over `inbound`, then deregisters the identity
    /// and waits for its bridge to unwind.
    pub async fn run<S>(mut self, mut inbound: S) -> ReadLoopExit
    where
        S: Stream<Item = InboundFrame> + Unpin + Send,
    {
        let exit = self
            .router
            .run(
                &mut inbound,
                self.transport.as_ref(),
                &self.metrics,
                &self.cancel,
            )
            .await;

        self.teardown(&exit).await;
        exit
    }

    async fn teardown(&mut self, exit: &ReadLoopExit) {
        let identity = self.router.identity().clone();
        self.release();

        let Some(bridge_task) = self.bridge_task.take() else {
            return;
        };

        match bridge_task.await {
            Ok(bridge_exit) => {
                let connected_secs = (Utc::now() - self.handle.connected_at).num_seconds();
                info!(
                    identity = %identity,
                    conn_id = %self.handle.id,
                    reason = ?exit,
                    bridge = ?bridge_exit,
                    connected_secs,
                    "Client disconnected"
                );
            }
            Err(e) => {
                warn!(identity = %identity, error = %e, "Bridge task did not finish cleanly");
            }
        }
    }

    /// Registry first, so concurrent lookups fail fast, then the bridge.
    /// Safe to repeat: only this connection's own entry is removed.
    fn release(&self) {
        self.registry
            .deregister_connection(self.router.identity(), self.handle.id);
        self.cancel.cancel();
    }
}

impl Drop for RelaySession {
    fn drop(&mut self) {
        self.release();
    }
}
