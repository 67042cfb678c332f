//! Error types for the room client.

use thiserror::Error;

/// Client-side session errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused the join (this user is banned from the room)
    #[error("Join denied: {0}")]
    JoinDenied(String),

    /// The host removed this user from the room
    #[error("Removed from the room: {0}")]
    Kicked(String),

    /// Connection failed or was lost
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
