//! Core domain models for the chat server.

mod connection;
mod error;
mod gateway;
mod message;
mod session;
mod value_object;

pub use connection::{Connection, ConnectionId, ConnectionRegistry};
pub use error::{BroadcastError, ValidationError};
pub use gateway::{BroadcastGateway, GatewayChannel};
#[cfg(test)]
pub use gateway::MockBroadcastGateway;
pub use message::{Message, MessageLog, MESSAGE_LOG_CAPACITY};
pub use session::SessionState;
pub use value_object::{MessageBody, Timestamp, Username};
