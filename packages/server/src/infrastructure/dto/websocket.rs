//! WebSocket event DTOs.
//!
//! Every frame on the wire is a JSON object with a `type` field naming the
//! event, plus the event's own camelCase fields. The two enums below cover
//! the full protocol: `ClientEvent` for inbound frames, `ServerEvent` for
//! outbound frames. The frontend editor and the CLI client both speak this
//! shape.

use serde::{Deserialize, Serialize};

use crate::domain::Language;

/// Cursor position inside the shared document (1-indexed, editor convention)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPosition {
    pub line_number: u32,
    pub column: u32,
}

/// Selected range inside the shared document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorSelection {
    pub start_line_number: u32,
    pub start_column: u32,
    pub end_line_number: u32,
    pub end_column: u32,
}

/// Room member as seen on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub user_id: String,
    pub username: String,
}

/// Reply inside a comment thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyDto {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub message: String,
    /// Unix timestamp in milliseconds (UTC)
    pub created_at: i64,
}

/// Comment thread anchored to a line of the shared document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadDto {
    pub id: String,
    pub line_number: u32,
    pub author_id: String,
    pub author_name: String,
    pub message: String,
    /// Unix timestamp in milliseconds (UTC)
    pub created_at: i64,
    pub resolved: bool,
    pub replies: Vec<ReplyDto>,
}

/// Inbound events (client -> server)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "join-room", rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        user_id: String,
        username: String,
    },
    #[serde(rename = "leave-room", rename_all = "camelCase")]
    LeaveRoom { room_id: String, user_id: String },
    #[serde(rename = "code-change", rename_all = "camelCase")]
    CodeChange { room_id: String, code: String },
    #[serde(rename = "language-change", rename_all = "camelCase")]
    LanguageChange {
        room_id: String,
        language: Language,
        user_id: String,
    },
    #[serde(rename = "run-code", rename_all = "camelCase")]
    RunCode {
        room_id: String,
        code: String,
        language: Language,
        /// stdin passed to the program; older clients omit the field
        #[serde(default)]
        input: String,
        user_id: String,
    },
    #[serde(rename = "cursor-update", rename_all = "camelCase")]
    CursorUpdate {
        room_id: String,
        user_id: String,
        #[serde(default)]
        position: Option<CursorPosition>,
        #[serde(default)]
        selection: Option<CursorSelection>,
    },
    #[serde(rename = "transfer-host", rename_all = "camelCase")]
    TransferHost {
        room_id: String,
        new_host_id: String,
        user_id: String,
    },
    #[serde(rename = "kick-user", rename_all = "camelCase")]
    KickUser {
        room_id: String,
        target_user_id: String,
        user_id: String,
    },
    #[serde(rename = "comment:add", rename_all = "camelCase")]
    CommentAdd {
        room_id: String,
        line_number: u32,
        message: String,
    },
    #[serde(rename = "comment:reply", rename_all = "camelCase")]
    CommentReply {
        room_id: String,
        comment_id: String,
        message: String,
    },
    #[serde(rename = "comment:resolve", rename_all = "camelCase")]
    CommentResolve { room_id: String, comment_id: String },
    #[serde(rename = "comment:unresolve", rename_all = "camelCase")]
    CommentUnresolve { room_id: String, comment_id: String },
}

/// Outbound events (server -> client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Full room snapshot delivered to the joining user
    #[serde(rename = "room-joined", rename_all = "camelCase")]
    RoomJoined {
        room_id: String,
        code: String,
        language: Language,
        users: Vec<UserDto>,
        host_user_id: String,
    },
    /// Existing comment threads delivered to the joining user
    #[serde(rename = "comment:init", rename_all = "camelCase")]
    CommentInit { comments: Vec<CommentThreadDto> },
    #[serde(rename = "user-joined", rename_all = "camelCase")]
    UserJoined { user_id: String, username: String },
    #[serde(rename = "user-left", rename_all = "camelCase")]
    UserLeft { user_id: String },
    #[serde(rename = "host-changed", rename_all = "camelCase")]
    HostChanged { host_user_id: String },
    #[serde(rename = "code-update", rename_all = "camelCase")]
    CodeUpdate { code: String },
    #[serde(rename = "language-update", rename_all = "camelCase")]
    LanguageUpdate { language: Language },
    #[serde(rename = "cursor-update", rename_all = "camelCase")]
    CursorUpdate {
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<CursorPosition>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selection: Option<CursorSelection>,
    },
    /// Exactly one of `output` / `error` is present
    #[serde(rename = "execution-result", rename_all = "camelCase")]
    ExecutionResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Sent to the kicked user only, before the rest of the room learns
    #[serde(rename = "kicked", rename_all = "camelCase")]
    Kicked { room_id: String, reason: String },
    #[serde(rename = "join-denied", rename_all = "camelCase")]
    JoinDenied { reason: String },
    #[serde(rename = "comment:added", rename_all = "camelCase")]
    CommentAdded { comment: CommentThreadDto },
    #[serde(rename = "comment:replied", rename_all = "camelCase")]
    CommentReplied { comment_id: String, reply: ReplyDto },
    #[serde(rename = "comment:resolved", rename_all = "camelCase")]
    CommentResolved { comment_id: String },
    #[serde(rename = "comment:unresolved", rename_all = "camelCase")]
    CommentUnresolved { comment_id: String },
}
