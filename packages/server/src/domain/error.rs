//! Error types for the server domain.

use thiserror::Error;

/// Validation failures for client-supplied values.
///
/// These never surface to other clients; the offending event is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("username is empty after trimming")]
    UsernameEmpty,

    #[error("username is too short (min: {min}, actual: {actual})")]
    UsernameTooShort { min: usize, actual: usize },

    #[error("username is too long (max: {max}, actual: {actual})")]
    UsernameTooLong { max: usize, actual: usize },

    #[error("message body is empty after trimming")]
    MessageBodyEmpty,

    #[error("message body is too long (max: {max}, actual: {actual})")]
    MessageBodyTooLong { max: usize, actual: usize },
}

/// Failures while pushing an event to a single connection.
///
/// Broadcast fan-out is best-effort and never returns these; only targeted
/// sends do.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("connection '{0}' is not attached to the gateway")]
    ConnectionNotFound(String),

    #[error("failed to push event: {0}")]
    PushFailed(String),
}
