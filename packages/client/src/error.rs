//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The server URL could not be understood
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}
