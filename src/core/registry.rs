//! Live set of overlay connections
//!
//! The map is private; callers go through `add`, `remove` and `snapshot`.
//! The lock is only held for map bookkeeping, never across network I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::category::Category;
use crate::core::connection::{Connection, ConnectionId};
use crate::error::{RelayError, Result};

pub struct ClientRegistry {
    connections: Mutex<HashMap<ConnectionId, Arc<Connection>>>,
    max_connections: usize,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::with_limit(usize::MAX)
    }
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that refuses to hold more than `max_connections` entries
    pub fn with_limit(max_connections: usize) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            max_connections,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<ConnectionId, Arc<Connection>>>> {
        Ok(self.connections.lock()?)
    }

    /// Insert a connection and mark it `Open`. Returns false if the id is
    /// already registered or the connection is no longer connecting, and
    /// `ConnectionError` when the registry is full.
    pub fn add(&self, connection: Arc<Connection>) -> Result<bool> {
        let mut connections = self.lock()?;
        if connections.contains_key(&connection.id) {
            return Ok(false);
        }
        if connections.len() >= self.max_connections {
            return Err(RelayError::ConnectionError(format!(
                "connection limit of {} reached",
                self.max_connections
            )));
        }
        if !connection.mark_open() {
            return Ok(false);
        }
        connections.insert(connection.id, connection);
        Ok(true)
    }

    /// Remove a connection if present. The connection enters `Closing`
    /// before the lock is released, so no broadcast starts a send to it.
    pub fn remove(&self, id: &ConnectionId) -> Result<Option<Arc<Connection>>> {
        let mut connections = self.lock()?;
        let removed = connections.remove(id);
        if let Some(connection) = &removed {
            connection.begin_close();
        }
        Ok(removed)
    }

    /// Point-in-time copy of the connections subscribed to `category`
    pub fn snapshot(&self, category: Category) -> Result<Vec<Arc<Connection>>> {
        let connections = self.lock()?;
        Ok(connections
            .values()
            .filter(|connection| connection.category == category)
            .cloned()
            .collect())
    }

    pub fn contains(&self, id: &ConnectionId) -> Result<bool> {
        Ok(self.lock()?.contains_key(id))
    }

    pub fn count(&self, category: Category) -> Result<usize> {
        let connections = self.lock()?;
        Ok(connections
            .values()
            .filter(|connection| connection.category == category)
            .count())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Remove every connection, moving each to `Closing`
    pub fn drain(&self) -> Result<Vec<Arc<Connection>>> {
        let mut connections = self.lock()?;
        let drained: Vec<_> = connections.drain().map(|(_, connection)| connection).collect();
        for connection in &drained {
            connection.begin_close();
        }
        Ok(drained)
    }
}

// Shared reference to the registry
pub type SharedRegistry = Arc<ClientRegistry>;
