//! Message formatting utilities for client display.

use chrono::DateTime;

use parlor_server::infrastructure::dto::websocket::{
    MessageDto, PresenceNotice, ServerEvent, TypingNotice, UserInfo,
};

/// Render an RFC 3339 timestamp as a short HH:MM:SS time, falling back to
/// the raw string when it does not parse.
fn short_time(rfc3339: &str) -> String {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|_| rfc3339.to_string())
}

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a server event for the terminal.
    ///
    /// Returns `None` for events that should not be rendered (a cleared
    /// typing indicator).
    pub fn format_event(event: &ServerEvent, current_username: &str) -> Option<String> {
        match event {
            ServerEvent::UsersList(users) => {
                Some(Self::format_users_list(users, current_username))
            }
            ServerEvent::MessageHistory(messages) => Some(Self::format_history(messages)),
            ServerEvent::NewMessage(message) => Some(Self::format_message(message)),
            ServerEvent::UserJoined(notice) => Some(Self::format_presence(notice, '+')),
            ServerEvent::UserLeft(notice) => Some(Self::format_presence(notice, '-')),
            ServerEvent::UserTyping(notice) => Self::format_typing(notice),
        }
    }

    /// Format the users-list snapshot showing everyone in the room
    pub fn format_users_list(users: &[UserInfo], current_username: &str) -> String {
        let mut output = String::new();
        output.push_str("\n\n============================================================\n");
        output.push_str("Online users:\n");

        if users.is_empty() {
            output.push_str("(nobody here)\n");
        } else {
            for user in users {
                let me_suffix = if user.username == current_username {
                    " (me)"
                } else {
                    ""
                };
                output.push_str(&format!(
                    "{}{} - joined at {}\n",
                    user.username,
                    me_suffix,
                    short_time(&user.joined_at)
                ));
            }
        }

        output.push_str("============================================================\n");
        output
    }

    /// Format the message-history snapshot sent on join
    pub fn format_history(messages: &[MessageDto]) -> String {
        if messages.is_empty() {
            return "(no recent messages)\n".to_string();
        }

        let mut output = String::new();
        output.push_str("Recent messages:\n");
        for message in messages {
            output.push_str(&format!(
                "  [{}] {}: {}\n",
                short_time(&message.timestamp),
                message.username,
                message.message
            ));
        }
        output
    }

    /// Format a live chat message
    pub fn format_message(message: &MessageDto) -> String {
        format!(
            "\n[{}] {}: {}\n",
            short_time(&message.timestamp),
            message.username,
            message.message
        )
    }

    /// Format a join/leave notice
    pub fn format_presence(notice: &PresenceNotice, sign: char) -> String {
        format!(
            "\n{} {} at {}\n",
            sign,
            notice.message,
            short_time(&notice.timestamp)
        )
    }

    /// Format a typing notice; a cleared indicator renders nothing
    pub fn format_typing(notice: &TypingNotice) -> Option<String> {
        if notice.is_typing {
            Some(format!("\n~ {} is typing...\n", notice.username))
        } else {
            None
        }
    }

    /// Format a raw text frame (when parsing fails)
    pub fn format_raw(text: &str) -> String {
        format!("\n<- Received: {}\n", text)
    }
}
