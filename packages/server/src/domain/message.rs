//! Chat messages and the bounded in-memory message log.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::value_object::{MessageBody, Timestamp, Username};

/// Maximum number of messages retained in memory
pub const MESSAGE_LOG_CAPACITY: usize = 100;

/// A chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Numeric identifier, wall-clock derived, strictly increasing
    pub id: i64,
    /// Sender's username, copied from the registry at send time
    pub username: Username,
    /// Message body
    pub body: MessageBody,
    /// Timestamp when the message was appended
    pub timestamp: Timestamp,
}

/// Bounded, append-only FIFO of chat messages.
///
/// Once the log exceeds its capacity, the oldest entries are evicted until
/// the bound holds again. Identifiers are derived from the wall clock but
/// bumped past the previous id, so rapid appends within the same millisecond
/// still get unique, increasing ids.
#[derive(Debug)]
pub struct MessageLog {
    messages: VecDeque<Message>,
    capacity: usize,
    last_id: i64,
}

impl MessageLog {
    /// Create an empty log with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(MESSAGE_LOG_CAPACITY)
    }

    /// Create an empty log with a custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
            last_id: 0,
        }
    }

    /// Append a message, assigning its id and timestamp from `now_millis`.
    ///
    /// Evicts from the front until the capacity bound holds.
    pub fn append(&mut self, username: Username, body: MessageBody, now_millis: i64) -> Message {
        let id = now_millis.max(self.last_id + 1);
        self.last_id = id;

        let message = Message {
            id,
            username,
            body,
            timestamp: Timestamp::new(now_millis),
        };
        self.messages.push_back(message.clone());

        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }

        message
    }

    /// The last `k` messages in insertion order (fewer if the log is shorter).
    pub fn recent(&self, k: usize) -> Vec<Message> {
        let skip = self.messages.len().saturating_sub(k);
        self.messages.iter().skip(skip).cloned().collect()
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}
