//! WebSocket chat server binary.
//!
//! Clients join with a username, exchange messages and typing indicators,
//! and receive presence notifications. All state is in memory.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parlor-server
//! cargo run --bin parlor-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;

use parlor_server::{
    infrastructure::gateway::WebSocketBroadcastGateway, session::SessionManager, ui::Server,
};
use parlor_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "parlor-server")]
#[command(about = "WebSocket chat server with broadcast support", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let gateway = Arc::new(WebSocketBroadcastGateway::new());
    let manager = Arc::new(SessionManager::new(gateway, Arc::new(SystemClock)));

    let server = Server::new(manager);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
