//! Conversions between domain models and wire DTOs.

use parlor_shared::time::millis_to_rfc3339;

use crate::domain::{Connection, ConnectionId, Message};

use super::websocket::{MessageDto, PresenceNotice, UserInfo};

impl From<(ConnectionId, &Connection)> for UserInfo {
    fn from((id, connection): (ConnectionId, &Connection)) -> Self {
        Self {
            id: id.to_string(),
            username: connection.username.as_str().to_string(),
            joined_at: millis_to_rfc3339(connection.joined_at.value()),
        }
    }
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            username: message.username.as_str().to_string(),
            message: message.body.as_str().to_string(),
            timestamp: millis_to_rfc3339(message.timestamp.value()),
        }
    }
}

impl PresenceNotice {
    /// Notice for a user joining the chat.
    pub fn joined(username: &str, at_millis: i64) -> Self {
        Self {
            username: username.to_string(),
            message: format!("{} joined the chat", username),
            timestamp: millis_to_rfc3339(at_millis),
        }
    }

    /// Notice for a user leaving the chat.
    pub fn left(username: &str, at_millis: i64) -> Self {
        Self {
            username: username.to_string(),
            message: format!("{} left the chat", username),
            timestamp: millis_to_rfc3339(at_millis),
        }
    }
}
