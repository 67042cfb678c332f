//! CLI client for collaborative code rooms.
//!
//! Joins a room over WebSocket, renders room events in the terminal and
//! sends operations via slash commands (/code, /run, /comment, ...).
//! Automatically reconnects on disconnection (max 5 attempts with 5 second
//! interval). A kick or a denied join exits immediately.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kobo-client -- --room room-1 --user-id alice
//! cargo run --bin kobo-client -- -r room-1 --user-id bob --username "Bob"
//! ```

use clap::Parser;

use kobo_client::{SessionConfig, run_client};
use kobo_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kobo-client")]
#[command(about = "CLI client for collaborative code rooms", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Room to join (created implicitly if it does not exist yet)
    #[arg(short = 'r', long)]
    room: String,

    /// User ID inside the room (one active member per user ID)
    #[arg(long)]
    user_id: String,

    /// Display name shown to other members (defaults to the user ID)
    #[arg(long)]
    username: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let username = args.username.unwrap_or_else(|| args.user_id.clone());
    let config = SessionConfig {
        url: args.url,
        room_id: args.room,
        user_id: args.user_id,
        username,
    };

    // Run the client
    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
