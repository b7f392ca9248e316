//! In-memory pub/sub for single-instance deployments and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use tracing::warn;

use relayhub_core::result::AppResult;
use relayhub_core::traits::transport::{PubSubMessage, PubSubTransport, Subscription};

type ChannelMap = Arc<RwLock<HashMap<String, broadcast::Sender<String>>>>;

/// In-memory pub/sub implementation.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    /// Channel name → broadcast sender
    channels: ChannelMap,
    /// Buffer size for channels
    capacity: usize,
}

impl MemoryTransport {
    /// Create a new in-memory pub/sub
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Number of open subscriptions on a channel
    pub async fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .read()
            .await
            .get(channel)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Number of channels with at least one subscriber
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

#[async_trait]
impl PubSubTransport for MemoryTransport {
    async fn publish(&self, channel: &str, payload: &str) -> AppResult<usize> {
        let channels = self.channels.read().await;
        Ok(channels
            .get(channel)
            .and_then(|tx| tx.send(payload.to_string()).ok())
            .unwrap_or(0))
    }

    async fn subscribe(&self, channel: &str) -> AppResult<Box<dyn Subscription>> {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);

        Ok(Box::new(MemorySubscription {
            channel: channel.to_string(),
            receiver: Some(tx.subscribe()),
            confirmed: false,
            channels: Arc::clone(&self.channels),
        }))
    }
}

/// Subscription to one in-memory channel.
#[derive(Debug)]
pub struct MemorySubscription {
    channel: String,
    receiver: Option<broadcast::Receiver<String>>,
    /// Whether the subscribe confirmation has been handed out
    confirmed: bool,
    channels: ChannelMap,
}

#[async_trait]
impl Subscription for MemorySubscription {
    fn channel(&self) -> &str {
        &self.channel
    }

    async fn next_message(&mut self) -> AppResult<Option<PubSubMessage>> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Ok(None);
        };

        if !self.confirmed {
            self.confirmed = true;
            return Ok(Some(PubSubMessage::Control {
                kind: "subscribe".to_string(),
                channel: self.channel.clone(),
            }));
        }

        loop {
            match receiver.recv().await {
                Ok(payload) => {
                    return Ok(Some(PubSubMessage::Data {
                        channel: self.channel.clone(),
                        payload,
                    }));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(channel = %self.channel, skipped, "Subscriber lagged, messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }

    async fn close(&mut self) -> AppResult<()> {
        if self.receiver.take().is_none() {
            return Ok(());
        }

        let mut channels = self.channels.write().await;
        if channels
            .get(&self.channel)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            channels.remove(&self.channel);
        }
        Ok(())
    }
}
