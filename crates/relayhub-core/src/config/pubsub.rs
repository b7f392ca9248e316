//! Pub/sub transport configuration.

use serde::Deserialize;

/// Which transport backs the per-identity channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PubSubProvider {
    /// Redis pub/sub, shared between relay instances.
    #[default]
    Redis,
    /// In-process broadcast channels, single instance only.
    Memory,
}

/// Top-level pub/sub configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PubSubConfig {
    /// Transport provider.
    #[serde(default)]
    pub provider: PubSubProvider,
    /// Redis-specific settings.
    #[serde(default)]
    pub redis: RedisPubSubConfig,
    /// In-memory settings.
    #[serde(default)]
    pub memory: MemoryPubSubConfig,
}

/// Redis transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisPubSubConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for RedisPubSubConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

/// In-memory transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryPubSubConfig {
    /// Per-channel buffer before slow subscribers start lagging.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for MemoryPubSubConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_channel_capacity() -> usize {
    256
}
