//! Connection registry: the single map from live identity to connection and bridge.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use relayhub_core::types::Identity;

use super::handle::{ConnectionHandle, ConnectionId};

/// Returned when an identity already has a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identity '{identity}' is already connected")]
pub struct AlreadyConnected {
    /// The identity that was already registered.
    pub identity: Identity,
}

/// A registered connection plus the token that stops its bridge.
#[derive(Debug, Clone)]
struct RegistryEntry {
    handle: Arc<ConnectionHandle>,
    bridge_cancel: CancellationToken,
}

/// Thread-safe registry of live connections, at most one per identity.
///
/// Check-and-insert happens under the map's shard lock for that identity,
/// so concurrent registrations of one identity cannot both succeed while
/// different identities proceed independently.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: DashMap<Identity, RegistryEntry>,
}

impl ConnectionRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Registers a connection under its identity.
    ///
    /// `bridge_cancel` must be the token the connection's bridge listens
    /// on; deregistration cancels it. The existing entry is left untouched
    /// when the identity is already connected.
    pub fn register(
        &self,
        handle: Arc<ConnectionHandle>,
        bridge_cancel: CancellationToken,
    ) -> Result<(), AlreadyConnected> {
        match self.entries.entry(handle.identity.clone()) {
            Entry::Occupied(_) => Err(AlreadyConnected {
                identity: handle.identity.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(RegistryEntry {
                    handle,
                    bridge_cancel,
                });
                Ok(())
            }
        }
    }

    /// Removes the identity's entry, if any, and cancels its bridge.
    ///
    /// Idempotent. The entry is gone before this returns, so lookups made
    /// afterwards fail fast; the bridge unwinds on its own task.
    pub fn deregister(&self, identity: &Identity) -> bool {
        match self.entries.remove(identity) {
            Some((_, entry)) => {
                Self::retire(entry);
                true
            }
            None => false,
        }
    }

    /// Like [`deregister`](Self::deregister), but only if the entry still
    /// belongs to connection `conn_id`.
    pub fn deregister_connection(&self, identity: &Identity, conn_id: ConnectionId) -> bool {
        match self
            .entries
            .remove_if(identity, |_, entry| entry.handle.id == conn_id)
        {
            Some((_, entry)) => {
                Self::retire(entry);
                true
            }
            None => false,
        }
    }

    fn retire(entry: RegistryEntry) {
        entry.handle.mark_closed();
        entry.bridge_cancel.cancel();
    }

    /// Gets the live connection for an identity.
    pub fn lookup(&self, identity: &Identity) -> Option<Arc<ConnectionHandle>> {
        self.entries
            .get(identity)
            .map(|entry| Arc::clone(&entry.value().handle))
    }

    /// Whether the identity has a live connection.
    pub fn contains(&self, identity: &Identity) -> bool {
        self.entries.contains_key(identity)
    }

    /// Returns the number of live connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all connected identities.
    pub fn identities(&self) -> Vec<Identity> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Deregisters every connection.
    pub fn clear(&self) -> usize {
        let identities = self.identities();
        identities
            .iter()
            .filter(|identity| self.deregister(identity))
            .count()
    }
}
