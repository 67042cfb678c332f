//! CLI room client for the realtime collaboration server.
//!
//! Connects over WebSocket, joins a room, renders inbound room events in
//! the terminal and sends room operations as slash commands.

mod command;
mod domain;
mod error;
mod formatter;
mod runner;
mod session;

pub use error::ClientError;
pub use runner::run_client;
pub use session::SessionConfig;
