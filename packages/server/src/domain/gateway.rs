//! Broadcast gateway trait.
//!
//! The session layer depends on this trait; the WebSocket implementation
//! lives in the infrastructure layer (dependency inversion).

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

use super::connection::ConnectionId;
use super::error::BroadcastError;

/// Channel used to push serialized events to one connection's writer task.
pub type GatewayChannel = mpsc::UnboundedSender<String>;

/// Fan-out of serialized events to open connections.
///
/// Delivery is fire-and-forget: fan-out methods log and skip unreachable
/// targets, only the targeted `to_one` reports failure to the caller.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BroadcastGateway: Send + Sync {
    /// Attach a newly opened connection's outbound channel.
    async fn attach(&self, id: ConnectionId, sender: GatewayChannel);

    /// Detach a closed connection.
    async fn detach(&self, id: &ConnectionId);

    /// Push a payload to a single connection.
    async fn to_one(&self, id: &ConnectionId, payload: &str) -> Result<(), BroadcastError>;

    /// Push a payload to every open connection.
    async fn to_all(&self, payload: &str);

    /// Push a payload to every open connection except `exclude`.
    async fn to_others(&self, exclude: &ConnectionId, payload: &str);
}
