//! Broadcast gateway implementations.
//!
//! Currently only WebSocket. The session layer depends on the
//! `BroadcastGateway` trait defined in the domain layer.

mod websocket;

pub use websocket::WebSocketBroadcastGateway;
