//! Shared utilities for the Parlor chat application.
//!
//! Logging setup and time handling used by both the server and the client.

pub mod logger;
pub mod time;
