//! HTTP and WebSocket request handlers.

mod http;
mod websocket;

pub use http::{health_check, status};
pub use websocket::websocket_handler;
