//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Status document served at `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    pub message: String,
    pub status: String,
    /// Number of currently joined connections
    pub users: usize,
    /// Number of messages retained in the log
    pub total_messages: usize,
}
