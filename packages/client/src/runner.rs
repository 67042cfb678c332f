//! Client execution logic with reconnection support.

use std::time::Duration;

use crate::domain::{should_attempt_reconnect, should_exit_immediately};
use crate::error::ClientError;
use crate::session::{SessionConfig, run_client_session};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the WebSocket client with reconnection logic
pub async fn run_client(config: SessionConfig) -> Result<(), ClientError> {
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Connecting to {} as '{}' (room '{}')",
            config.url,
            config.user_id,
            config.room_id
        );

        match run_client_session(&config).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                // Deliberate exit (/leave or Ctrl+C), don't reconnect
                break;
            }
            Err(e) => {
                // A ban or a kick means the server does not want us back
                if should_exit_immediately(&e) {
                    tracing::error!("{}", e);
                    std::process::exit(1);
                }

                if !should_attempt_reconnect(&e, reconnect_count, MAX_RECONNECT_ATTEMPTS) {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        MAX_RECONNECT_ATTEMPTS
                    );
                    std::process::exit(1);
                }

                reconnect_count += 1;
                tracing::warn!("Connection lost: {}", e);
                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }

    Ok(())
}
