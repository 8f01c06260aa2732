//! WebSocket implementation of the broadcast gateway.
//!
//! Owns the map of open connections to their outbound channels. The
//! channels are created by the UI layer at upgrade time; this type only
//! pushes pre-serialized payloads into them. Fan-out failures are logged
//! and skipped, never retried.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{BroadcastError, BroadcastGateway, ConnectionId, GatewayChannel};

/// Gateway pushing events over per-connection mpsc channels.
pub struct WebSocketBroadcastGateway {
    /// Outbound channel for every open connection, joined or not
    clients: Mutex<HashMap<ConnectionId, GatewayChannel>>,
}

impl WebSocketBroadcastGateway {
    /// Create an empty gateway.
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for WebSocketBroadcastGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BroadcastGateway for WebSocketBroadcastGateway {
    async fn attach(&self, id: ConnectionId, sender: GatewayChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(id, sender);
        tracing::debug!("Connection '{}' attached to gateway", id);
    }

    async fn detach(&self, id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(id);
        tracing::debug!("Connection '{}' detached from gateway", id);
    }

    async fn to_one(&self, id: &ConnectionId, payload: &str) -> Result<(), BroadcastError> {
        let clients = self.clients.lock().await;

        if let Some(sender) = clients.get(id) {
            sender
                .send(payload.to_string())
                .map_err(|e| BroadcastError::PushFailed(e.to_string()))?;
            tracing::debug!("Pushed event to connection '{}'", id);
            Ok(())
        } else {
            Err(BroadcastError::ConnectionNotFound(id.to_string()))
        }
    }

    async fn to_all(&self, payload: &str) {
        let clients = self.clients.lock().await;

        for (id, sender) in clients.iter() {
            if sender.send(payload.to_string()).is_err() {
                tracing::warn!("Failed to push event to connection '{}'", id);
            }
        }
    }

    async fn to_others(&self, exclude: &ConnectionId, payload: &str) {
        let clients = self.clients.lock().await;

        for (id, sender) in clients.iter() {
            if id == exclude {
                continue;
            }
            if sender.send(payload.to_string()).is_err() {
                tracing::warn!("Failed to push event to connection '{}'", id);
            }
        }
    }
}
