//! WebSocket chat client binary.
//!
//! Connects to a chat server, joins with the given username, and sends
//! messages typed on stdin. Automatically reconnects on disconnection
//! (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parlor-client -- --username alice
//! cargo run --bin parlor-client -- -u bob --url ws://127.0.0.1:8080/ws
//! ```

use clap::Parser;

use parlor_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "parlor-client")]
#[command(about = "Terminal chat client for Parlor", long_about = None)]
struct Args {
    /// Username to join the chat with (2 to 32 characters)
    #[arg(short = 'u', long)]
    username: String,

    /// WebSocket server URL
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = parlor_client::run_client(args.url, args.username).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
