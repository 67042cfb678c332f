//! ドメイン層
//!
//! コードルームのドメインモデル（エンティティ・値オブジェクト）と、
//! ドメイン層が必要とするインターフェース（Repository / Pusher / Executor）を定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

mod code_executor;
mod entity;
mod error;
mod message_pusher;
mod registry;
mod value_object;

pub use code_executor::{CodeExecutor, ExecutionReport, ExecutionRequest};
#[cfg(test)]
pub use code_executor::MockCodeExecutor;
pub use entity::{Admission, CommentThread, Departure, Participant, Reply, Room, RoomSnapshot, RoomSummary};
pub use error::{ExecutionError, MessagePushError, RegistryError, RoomError, ValidationError};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use registry::{
    CommentAddOutcome, CommentFlagOutcome, CommentReplyOutcome, DeniedReason, JoinOutcome,
    KickOutcome, LeaveOutcome, RoomRegistry, SyncOutcome, TransferOutcome,
};
pub use value_object::{
    CommentId, ConnectionId, Language, ReplyId, RoomId, Timestamp, UserId, Username,
};
