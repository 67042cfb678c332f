//! Server state and connection management.

use std::sync::Arc;

use crate::domain::MessagePusher;
use crate::usecase::{
    CommentUseCase, CursorRelayUseCase, DisconnectUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
    JoinRoomUseCase, KickUserUseCase, LeaveRoomUseCase, RunCodeUseCase, SyncDocumentUseCase,
    TransferHostUseCase,
};

/// Shared application state
pub struct AppState {
    /// MessagePusher（接続の登録・解除をハンドラが直接行うため保持する）
    pub message_pusher: Arc<dyn MessagePusher>,
    /// JoinRoomUseCase（ルーム参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（ルーム退出のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// DisconnectUseCase（切断処理のユースケース）
    pub disconnect_usecase: Arc<DisconnectUseCase>,
    /// SyncDocumentUseCase（コード・言語同期のユースケース）
    pub sync_document_usecase: Arc<SyncDocumentUseCase>,
    /// RunCodeUseCase（コード実行のユースケース）
    pub run_code_usecase: Arc<RunCodeUseCase>,
    /// CursorRelayUseCase（カーソル中継のユースケース）
    pub cursor_relay_usecase: Arc<CursorRelayUseCase>,
    /// TransferHostUseCase（ホスト移譲のユースケース）
    pub transfer_host_usecase: Arc<TransferHostUseCase>,
    /// KickUserUseCase（メンバー追放のユースケース）
    pub kick_user_usecase: Arc<KickUserUseCase>,
    /// CommentUseCase（コメントスレッドのユースケース）
    pub comment_usecase: Arc<CommentUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
}
