//! Relay metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Cumulative relay counters plus the live subscription gauge.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Connections admitted since start
    connections_total: AtomicU64,
    /// Attempts rejected by the identity gate
    auth_failures: AtomicU64,
    /// Attempts rejected because the identity was already connected
    duplicate_rejections: AtomicU64,
    /// Transport subscriptions currently open
    subscriptions_active: AtomicU64,
    /// Messages published to the transport by read loops
    messages_published: AtomicU64,
    /// Messages written to connections by bridges
    messages_forwarded: AtomicU64,
    /// Controller frames answered with a notice instead of routed
    malformed_frames: AtomicU64,
}

impl RelayMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an admitted connection
    pub fn connection_admitted(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a gate rejection
    pub fn auth_failed(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a duplicate-identity rejection
    pub fn duplicate_rejected(&self) {
        self.duplicate_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a subscription being opened
    pub fn subscription_opened(&self) {
        self.subscriptions_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a subscription being closed
    pub fn subscription_closed(&self) {
        let _ = self
            .subscriptions_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Record a publish from a read loop
    pub fn message_published(&self) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a payload forwarded to a connection
    pub fn message_forwarded(&self) {
        self.messages_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a malformed controller frame
    pub fn malformed_frame(&self) {
        self.malformed_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Subscriptions currently open
    pub fn active_subscriptions(&self) -> u64 {
        self.subscriptions_active.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self, active_connections: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            active_connections: active_connections as u64,
            pubsub_connections: self.subscriptions_active.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            duplicate_rejections: self.duplicate_rejections.load(Ordering::Relaxed),
            messages_published: self.messages_published.load(Ordering::Relaxed),
            messages_forwarded: self.messages_forwarded.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Live registered connections
    pub active_connections: u64,
    /// Open transport subscriptions
    pub pubsub_connections: u64,
    /// Connections admitted since start
    pub connections_total: u64,
    /// Gate rejections
    pub auth_failures: u64,
    /// Duplicate-identity rejections
    pub duplicate_rejections: u64,
    /// Messages published by read loops
    pub messages_published: u64,
    /// Messages forwarded by bridges
    pub messages_forwarded: u64,
    /// Malformed controller frames
    pub malformed_frames: u64,
}
