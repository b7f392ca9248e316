//! Bridges between the pub/sub transport and live connections.

pub mod channel_bridge;
pub mod memory_pubsub;
pub mod redis_pubsub;

use std::sync::Arc;

use relayhub_core::config::pubsub::{PubSubConfig, PubSubProvider};
use relayhub_core::error::AppError;
use relayhub_core::traits::transport::PubSubTransport;

pub use channel_bridge::{BridgeExit, ChannelBridge};
pub use memory_pubsub::MemoryTransport;

/// Builds the transport selected by configuration.
pub async fn build_transport(config: &PubSubConfig) -> Result<Arc<dyn PubSubTransport>, AppError> {
    match config.provider {
        PubSubProvider::Memory => Ok(Arc::new(MemoryTransport::new(
            config.memory.channel_capacity,
        ))),
        #[cfg(feature = "redis-pubsub")]
        PubSubProvider::Redis => Ok(Arc::new(
            redis_pubsub::RedisTransport::connect(&config.redis.url).await?,
        )),
        #[cfg(not(feature = "redis-pubsub"))]
        PubSubProvider::Redis => Err(AppError::configuration(
            "Redis pub/sub requested but the redis-pubsub feature is disabled",
        )),
    }
}
