//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::Language;

/// Entry of the room list (`GET /api/rooms`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    /// User IDs of the current members
    pub participants: Vec<String>,
    pub language: Language,
    pub host_user_id: String,
    /// RFC 3339 (UTC)
    pub created_at: String,
}

/// Member entry of the room detail response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDetailDto {
    pub user_id: String,
    pub username: String,
    /// RFC 3339 (UTC)
    pub joined_at: String,
}

/// Room detail (`GET /api/rooms/{room_id}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub id: String,
    pub participants: Vec<ParticipantDetailDto>,
    pub language: Language,
    pub host_user_id: String,
    pub comment_count: usize,
    /// RFC 3339 (UTC)
    pub created_at: String,
}
