//! WebSocket chat server library.
//!
//! Provides the session and broadcast model for a minimal realtime chat
//! application: clients join with a username, exchange messages and typing
//! notifications, and receive presence events over a persistent WebSocket
//! connection.

// layers
pub mod domain;
pub mod infrastructure;
pub mod session;
pub mod ui;
