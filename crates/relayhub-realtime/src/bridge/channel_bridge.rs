//! Channel bridge. Forwards one identity's pub/sub channel into its live connection.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use relayhub_core::error::AppError;
use relayhub_core::result::AppResult;
use relayhub_core::traits::transport::{PubSubMessage, PubSubTransport, Subscription};
use relayhub_core::types::Identity;

use crate::connection::handle::ConnectionId;
use crate::connection::registry::ConnectionRegistry;
use crate::metrics::RelayMetrics;

/// Why a bridge stopped forwarding.
#[derive(Debug)]
pub enum BridgeExit {
    /// The owning connection's teardown cancelled the bridge.
    Cancelled,
    /// The identity is no longer registered to this connection.
    Deregistered,
    /// The connection's outbound queue is gone.
    ConnectionClosed,
    /// The transport ended the subscription.
    TransportClosed,
    /// The transport failed.
    Failed(AppError),
}

/// Per-connection task forwarding channel traffic to the connection.
///
/// Owns its subscription exclusively. Whatever ends the forwarding loop,
/// the subscription is unsubscribed and closed before the task returns.
#[derive(Debug)]
pub struct ChannelBridge {
    identity: Identity,
    connection_id: ConnectionId,
    subscription: Box<dyn Subscription>,
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<RelayMetrics>,
    cancel: CancellationToken,
}

impl ChannelBridge {
    /// Subscribes to the identity's channel.
    ///
    /// The subscription is live when this returns, so nothing published
    /// afterwards is missed once [`spawn`](Self::spawn) runs.
    pub async fn open(
        transport: &dyn PubSubTransport,
        identity: Identity,
        connection_id: ConnectionId,
        registry: Arc<ConnectionRegistry>,
        metrics: Arc<RelayMetrics>,
        cancel: CancellationToken,
    ) -> AppResult<Self> {
        let subscription = transport.subscribe(identity.channel()).await?;
        metrics.subscription_opened();

        debug!(
            identity = %identity,
            conn_id = %connection_id,
            channel = %subscription.channel(),
            "Bridge subscribed"
        );

        Ok(Self {
            identity,
            connection_id,
            subscription,
            registry,
            metrics,
            cancel,
        })
    }

    /// Runs the bridge on its own task.
    pub fn spawn(self) -> JoinHandle<BridgeExit> {
        tokio::spawn(self.run())
    }

    /// Forwards until cancelled or the connection/transport goes away,
    /// then tears the subscription down.
    ///
    /// Exiting for any reason other than cancellation cancels the token
    /// too, which ends the owning connection's session.
    pub async fn run(mut self) -> BridgeExit {
        let exit = self.forward().await;
        self.teardown().await;

        match &exit {
            BridgeExit::Cancelled => {
                debug!(identity = %self.identity, "Bridge cancelled");
            }
            BridgeExit::Failed(e) => {
                error!(identity = %self.identity, error = %e, "Bridge transport error");
            }
            other => {
                info!(identity = %self.identity, exit = ?other, "Bridge stopped");
            }
        }

        if !matches!(exit, BridgeExit::Cancelled) {
            self.cancel.cancel();
        }

        exit
    }

    async fn forward(&mut self) -> BridgeExit {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return BridgeExit::Cancelled,
                next = self.subscription.next_message() => next,
            };

            let payload = match next {
                Ok(Some(PubSubMessage::Data { payload, .. })) => payload,
                Ok(Some(PubSubMessage::Control { kind, .. })) => {
                    debug!(identity = %self.identity, kind = %kind, "Ignoring control message");
                    continue;
                }
                Ok(None) => return BridgeExit::TransportClosed,
                Err(e) => return BridgeExit::Failed(e),
            };

            let handle = match self.registry.lookup(&self.identity) {
                Some(handle) if handle.id == self.connection_id => handle,
                _ => return BridgeExit::Deregistered,
            };

            let delivered = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return BridgeExit::Cancelled,
                delivered = handle.send(payload) => delivered,
            };

            if !delivered {
                return BridgeExit::ConnectionClosed;
            }
            self.metrics.message_forwarded();
        }
    }

    async fn teardown(&mut self) {
        if let Err(e) = self.subscription.close().await {
            warn!(identity = %self.identity, error = %e, "Failed to close subscription");
        }
        self.metrics.subscription_closed();
    }
}
