//! Conversion logic between DTOs and domain entities.

use kobo_shared::time::timestamp_to_rfc3339;

use crate::domain::{CommentThread, Participant, Reply, RoomSnapshot, RoomSummary};
use crate::infrastructure::dto::http as http_dto;
use crate::infrastructure::dto::websocket as ws_dto;

// ========================================
// Domain Entity → WebSocket DTO
// ========================================

impl From<Participant> for ws_dto::UserDto {
    fn from(model: Participant) -> Self {
        Self {
            user_id: model.user_id.into_string(),
            username: model.username.into_string(),
        }
    }
}

impl From<Reply> for ws_dto::ReplyDto {
    fn from(model: Reply) -> Self {
        Self {
            id: model.id.into_string(),
            author_id: model.author_id.into_string(),
            author_name: model.author_name.into_string(),
            message: model.message,
            created_at: model.created_at.value(),
        }
    }
}

impl From<CommentThread> for ws_dto::CommentThreadDto {
    fn from(model: CommentThread) -> Self {
        Self {
            id: model.id.into_string(),
            line_number: model.line_number,
            author_id: model.author_id.into_string(),
            author_name: model.author_name.into_string(),
            message: model.message,
            created_at: model.created_at.value(),
            resolved: model.resolved,
            replies: model.replies.into_iter().map(Into::into).collect(),
        }
    }
}

// ========================================
// Domain Entity → HTTP DTO
// ========================================

impl From<RoomSummary> for http_dto::RoomSummaryDto {
    fn from(model: RoomSummary) -> Self {
        Self {
            id: model.room_id.into_string(),
            participants: model
                .participant_user_ids
                .into_iter()
                .map(|id| id.into_string())
                .collect(),
            language: model.language,
            host_user_id: model.host_user_id.into_string(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}

impl From<Participant> for http_dto::ParticipantDetailDto {
    fn from(model: Participant) -> Self {
        Self {
            user_id: model.user_id.into_string(),
            username: model.username.into_string(),
            joined_at: timestamp_to_rfc3339(model.joined_at.value()),
        }
    }
}

impl From<RoomSnapshot> for http_dto::RoomDetailDto {
    fn from(model: RoomSnapshot) -> Self {
        Self {
            id: model.room_id.into_string(),
            participants: model.participants.into_iter().map(Into::into).collect(),
            language: model.language,
            host_user_id: model.host_user_id.into_string(),
            comment_count: model.comments.len(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}
