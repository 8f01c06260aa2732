//! Connection identity and the registry of joined connections.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_object::{Timestamp, Username};

/// Opaque identifier for a live transport connection.
///
/// Assigned at WebSocket upgrade time; clients never choose it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A joined connection: the identity the client supplied and when it joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Username supplied at join time
    pub username: Username,
    /// Timestamp when the connection joined
    pub joined_at: Timestamp,
}

impl Connection {
    /// Create a new Connection.
    pub fn new(username: Username, joined_at: Timestamp) -> Self {
        Self {
            username,
            joined_at,
        }
    }
}

/// Registry of currently joined connections.
///
/// One entry per live connection that has completed a `join`. Connections
/// that are open but unjoined are not listed here.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a connection under the given id.
    ///
    /// A repeated join on the same id overwrites the entry; the displaced
    /// connection is returned so the caller can treat it as a rename.
    pub fn register(&mut self, id: ConnectionId, connection: Connection) -> Option<Connection> {
        self.entries.insert(id, connection)
    }

    /// Look up a connection by id.
    pub fn lookup(&self, id: &ConnectionId) -> Option<&Connection> {
        self.entries.get(id)
    }

    /// Remove a connection by id, returning it if it was registered.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<Connection> {
        self.entries.remove(id)
    }

    /// Snapshot of all registered connections.
    ///
    /// Sorted by username for consistent ordering.
    pub fn list_all(&self) -> Vec<(ConnectionId, Connection)> {
        let mut all: Vec<(ConnectionId, Connection)> = self
            .entries
            .iter()
            .map(|(id, conn)| (*id, conn.clone()))
            .collect();
        all.sort_by(|a, b| a.1.username.as_str().cmp(b.1.username.as_str()));
        all
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
