//! Two-lane connection registry.

use std::sync::Arc;

use dashmap::DashMap;

use super::handle::{ConnectionHandle, ConnectionId, Lane};

/// Thread-safe registry of all live connections, split by lane.
///
/// A connection is inserted into exactly one map, chosen by its lane, and
/// never moves between them. Removal clears both maps and is idempotent,
/// so the pools stay disjoint and a closed connection is in neither.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// Ordinary broadcast clients.
    broadcast: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// Admin observers.
    admin: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the pool matching its lane.
    pub fn insert(&self, handle: Arc<ConnectionHandle>) {
        match handle.lane {
            Lane::Broadcast => self.broadcast.insert(handle.id, handle),
            Lane::Admin => self.admin.insert(handle.id, handle),
        };
    }

    /// Removes a connection from both lanes. No-op for unknown ids.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let broadcast = self.broadcast.remove(conn_id).map(|(_, handle)| handle);
        let admin = self.admin.remove(conn_id).map(|(_, handle)| handle);
        broadcast.or(admin)
    }

    /// Returns the number of broadcast clients.
    pub fn broadcast_count(&self) -> usize {
        self.broadcast.len()
    }

    /// Returns the number of admin observers.
    pub fn admin_count(&self) -> usize {
        self.admin.len()
    }

    /// Returns all broadcast-lane handles.
    ///
    /// Iteration order across the pool is unspecified and must not be
    /// relied upon.
    pub fn broadcast_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.broadcast
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns all admin-lane handles.
    pub fn admin_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.admin
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
