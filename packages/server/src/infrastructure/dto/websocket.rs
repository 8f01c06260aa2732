//! WebSocket event DTOs.
//!
//! Every frame on the wire is a JSON envelope `{"event": ..., "data": ...}`.
//! Field names are camelCase to match the browser-facing contract.

use serde::{Deserialize, Serialize};

/// Events a client may send to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Join the chat with a username
    Join(JoinPayload),
    /// Send a chat message
    SendMessage(SendMessagePayload),
    /// Typing indicator; the payload is the raw typing flag
    Typing(bool),
}

/// Payload of a `join` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinPayload {
    pub username: String,
}

/// Payload of a `sendMessage` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessagePayload {
    pub message: String,
}

/// Events the server pushes to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Registry snapshot, sent to the joiner only
    UsersList(Vec<UserInfo>),
    /// Last messages, sent to the joiner only
    MessageHistory(Vec<MessageDto>),
    /// A chat message, broadcast to all connections
    NewMessage(MessageDto),
    /// Join notification, broadcast to all other connections
    UserJoined(PresenceNotice),
    /// Leave notification, broadcast to all other connections
    UserLeft(PresenceNotice),
    /// Typing-state change, broadcast to all other connections
    UserTyping(TypingNotice),
}

impl ServerEvent {
    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> String {
        // Serialization of these plain structs cannot fail
        serde_json::to_string(self).unwrap()
    }
}

/// One entry of a `usersList` snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// Opaque connection identifier
    pub id: String,
    pub username: String,
    /// RFC 3339 timestamp of the join
    pub joined_at: String,
}

/// Wire form of a chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: i64,
    pub username: String,
    pub message: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// Join/leave notification payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceNotice {
    pub username: String,
    /// Human-readable notice, e.g. "alice joined the chat"
    pub message: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// Typing-state payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    pub username: String,
    pub is_typing: bool,
}
