//! ユースケース層
//!
//! クライアントの 1 操作 = 1 ユースケースとして実装します。
//! 各ユースケースは Domain 層のインターフェース（Registry / Pusher / Executor）
//! にのみ依存し、状態遷移は Registry に委ね、遷移結果に含まれる通知先へ
//! イベントを配送します。

mod comment;
mod cursor;
mod disconnect;
mod error;
mod get_room_detail;
mod get_rooms;
mod join_room;
mod kick_user;
mod leave_room;
mod run_code;
mod sync_document;
mod transfer_host;

pub use comment::CommentUseCase;
pub use cursor::CursorRelayUseCase;
pub use disconnect::{DisconnectUseCase, DisconnectWatchdog};
pub use error::GetRoomDetailError;
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::JoinRoomUseCase;
pub use kick_user::{KICKED_REASON, KickUserUseCase};
pub use leave_room::LeaveRoomUseCase;
pub use run_code::{
    EXECUTION_IN_PROGRESS_ERROR, EXECUTION_UNAVAILABLE_ERROR, RunCodeUseCase,
};
pub use sync_document::SyncDocumentUseCase;
pub use transfer_host::TransferHostUseCase;
