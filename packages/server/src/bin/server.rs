//! Realtime room coordination server for a collaborative code editor.
//!
//! Hosts rooms over WebSocket: shared document sync, host arbitration,
//! code execution through an external provider, cursor presence and
//! line comments.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kobo-server
//! cargo run --bin kobo-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use kobo_server::{
    domain::{CodeExecutor, MessagePusher, RoomRegistry},
    infrastructure::{
        code_executor::HttpCodeExecutor, message_pusher::WebSocketMessagePusher,
        registry::InMemoryRoomRegistry,
    },
    ui::{Server, state::AppState},
    usecase::{
        CommentUseCase, CursorRelayUseCase, DisconnectUseCase, DisconnectWatchdog,
        GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, KickUserUseCase, LeaveRoomUseCase,
        RunCodeUseCase, SyncDocumentUseCase, TransferHostUseCase,
    },
};
use kobo_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "kobo-server")]
#[command(about = "Realtime room coordination server for collaborative coding", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Seconds a disconnected member may reconnect before being removed
    #[arg(long, default_value = "5")]
    grace_secs: u64,

    /// Code execution provider endpoint
    #[arg(long, default_value = "https://api.jdoodle.com/v1/execute")]
    exec_url: String,

    /// Timeout in seconds for a single code execution call
    #[arg(long, default_value = "10")]
    exec_timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Provider credentials come from the environment, not the command line
    let client_id = std::env::var("KOBO_EXEC_CLIENT_ID").unwrap_or_default();
    let client_secret = std::env::var("KOBO_EXEC_CLIENT_SECRET").unwrap_or_default();
    if client_id.is_empty() || client_secret.is_empty() {
        tracing::warn!(
            "KOBO_EXEC_CLIENT_ID / KOBO_EXEC_CLIENT_SECRET not set; code execution will fail"
        );
    }

    // Initialize dependencies in order:
    // 1. Registry
    // 2. MessagePusher
    // 3. CodeExecutor
    // 4. Watchdog + UseCases
    // 5. AppState + Server

    // 1. Create Registry (in-memory room store)
    let registry: Arc<dyn RoomRegistry> =
        Arc::new(InMemoryRoomRegistry::new(Arc::new(SystemClock)));

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

    // 3. Create CodeExecutor (HTTP client for the execution provider)
    let executor: Arc<dyn CodeExecutor> = match HttpCodeExecutor::new(
        args.exec_url.clone(),
        client_id,
        client_secret,
        Duration::from_secs(args.exec_timeout_secs),
    ) {
        Ok(executor) => Arc::new(executor),
        Err(e) => {
            tracing::error!("Failed to build execution provider client: {}", e);
            std::process::exit(1);
        }
    };

    // 4. Create the disconnection watchdog and UseCases
    let watchdog = Arc::new(DisconnectWatchdog::new(Duration::from_secs(
        args.grace_secs,
    )));
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        registry.clone(),
        message_pusher.clone(),
        watchdog.clone(),
    ));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(
        registry.clone(),
        message_pusher.clone(),
    ));
    let disconnect_usecase = Arc::new(DisconnectUseCase::new(
        registry.clone(),
        message_pusher.clone(),
        watchdog.clone(),
    ));
    let sync_document_usecase = Arc::new(SyncDocumentUseCase::new(
        registry.clone(),
        message_pusher.clone(),
    ));
    let run_code_usecase = Arc::new(RunCodeUseCase::new(
        registry.clone(),
        message_pusher.clone(),
        executor.clone(),
    ));
    let cursor_relay_usecase = Arc::new(CursorRelayUseCase::new(
        registry.clone(),
        message_pusher.clone(),
    ));
    let transfer_host_usecase = Arc::new(TransferHostUseCase::new(
        registry.clone(),
        message_pusher.clone(),
    ));
    let kick_user_usecase = Arc::new(KickUserUseCase::new(
        registry.clone(),
        message_pusher.clone(),
    ));
    let comment_usecase = Arc::new(CommentUseCase::new(
        registry.clone(),
        message_pusher.clone(),
    ));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(registry.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(registry.clone()));

    // 5. Create and run the server
    let state = AppState {
        message_pusher,
        join_room_usecase,
        leave_room_usecase,
        disconnect_usecase,
        sync_document_usecase,
        run_code_usecase,
        cursor_relay_usecase,
        transfer_host_usecase,
        kick_user_usecase,
        comment_usecase,
        get_rooms_usecase,
        get_room_detail_usecase,
    };
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
