//! Individual relay connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use relayhub_core::types::{Identity, Role};

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// A handle to a single live connection.
///
/// Holds the sender half of the connection's outbound queue. Payloads
/// pushed here are written to the socket verbatim, in order.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Identity that owns this connection
    pub identity: Identity,
    /// Role of the identity
    pub role: Role,
    /// Sender for outbound payloads
    sender: mpsc::Sender<String>,
    /// When the connection was admitted
    pub connected_at: DateTime<Utc>,
    /// Whether the connection is still alive
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(identity: Identity, role: Role, sender: mpsc::Sender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            role,
            sender,
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
        }
    }

    /// Queue a payload for this connection.
    ///
    /// Waits for room in the queue. Returns `false` once the connection
    /// is closed or its writer has gone away.
    pub async fn send(&self, payload: String) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.send(payload).await {
            Ok(()) => true,
            Err(_) => {
                self.mark_closed();
                false
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as closed
    pub fn mark_closed(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_delivers_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(Identity::from("TV"), Role::Device, tx);

        assert!(handle.send("a".to_string()).await);
        assert!(handle.send("b".to_string()).await);
        assert_eq!(rx.recv().await.as_deref(), Some("a"));
        assert_eq!(rx.recv().await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_marks_closed() {
        let (tx, rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(Identity::from("TV"), Role::Device, tx);
        drop(rx);

        assert!(!handle.send("lost".to_string()).await);
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_closed_handle_refuses_sends() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(Identity::from("LLM"), Role::Controller, tx);
        handle.mark_closed();

        assert!(!handle.send("x".to_string()).await);
        assert!(rx.try_recv().is_err());
    }
}
