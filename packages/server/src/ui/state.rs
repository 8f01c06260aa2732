//! Server state shared across request handlers.

use std::sync::Arc;

use crate::session::SessionManager;

/// Shared application state
pub struct AppState {
    /// Session manager owning the registry, log, and gateway
    pub manager: Arc<SessionManager>,
}
