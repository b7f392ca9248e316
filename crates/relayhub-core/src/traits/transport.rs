//! Publish/subscribe transport abstraction.
//!
//! The relay fans messages out through named channels. Implementations
//! must deliver messages published to one channel to that channel's
//! subscribers in publish order; nothing is promised across channels.

use async_trait::async_trait;

use crate::result::AppResult;

/// A message received on a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PubSubMessage {
    /// A payload published to the channel.
    Data {
        /// Channel the payload arrived on.
        channel: String,
        /// The payload, verbatim.
        payload: String,
    },
    /// Subscription bookkeeping (confirmations and the like).
    Control {
        /// Control message kind, e.g. `"subscribe"`.
        kind: String,
        /// Channel the control message refers to.
        channel: String,
    },
}

/// Publishing side of the transport, shared by every connection.
#[async_trait]
pub trait PubSubTransport: Send + Sync + std::fmt::Debug {
    /// Publishes `payload` to `channel`.
    ///
    /// Returns how many subscribers received it. Zero is not an error:
    /// delivery is best-effort and nobody may be listening.
    async fn publish(&self, channel: &str, payload: &str) -> AppResult<usize>;

    /// Opens a dedicated subscription on `channel`.
    ///
    /// The subscription is active once this returns.
    async fn subscribe(&self, channel: &str) -> AppResult<Box<dyn Subscription>>;
}

/// A live subscription to a single channel.
#[async_trait]
pub trait Subscription: Send + std::fmt::Debug {
    /// Channel this subscription listens on.
    fn channel(&self) -> &str;

    /// Waits for the next message.
    ///
    /// `Ok(None)` means the transport closed the subscription. Must be
    /// cancel safe: dropping the future loses no message.
    async fn next_message(&mut self) -> AppResult<Option<PubSubMessage>>;

    /// Unsubscribes, then closes the underlying connection. Idempotent.
    async fn close(&mut self) -> AppResult<()>;
}
