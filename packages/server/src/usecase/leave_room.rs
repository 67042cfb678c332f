//! UseCase: ルーム退出処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveRoomUseCase::execute() メソッド
//! - 明示的な退出（leave-room イベント）に伴う通知
//!
//! ### なぜこのテストが必要か
//! - 退出が残存メンバーに user-left として届くことを保証
//! - ホスト退出時に host-changed が user-left の後に届くことを保証
//! - 最後のメンバーの退出で通知が発生しないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：一般メンバーの退出、ホストの退出
//! - エッジケース：最後のメンバーの退出（ルーム削除）
//! - 異常系：非メンバー・存在しないルームからの退出

use std::sync::Arc;

use crate::domain::{
    LeaveOutcome, MessagePusher, Participant, RegistryError, RoomId, RoomRegistry, UserId,
};
use crate::infrastructure::dto::websocket::ServerEvent;

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    /// Registry（ルーム状態管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// ルーム退出を実行
    pub async fn execute(&self, room_id: &RoomId, user_id: &UserId) -> Result<(), RegistryError> {
        // 1. Registry から退出させる（ホスト移譲・ルーム削除は Registry 側で処理）
        let outcome = self.registry.leave(room_id, user_id).await?;

        if outcome.room_removed {
            tracing::info!("Room '{}' removed (last member left)", room_id.as_str());
        }

        // 2. 残存メンバーに通知する
        broadcast_departure(&self.message_pusher, &outcome).await;

        Ok(())
    }
}

/// 退出（明示的な leave・切断猶予の満了）を残存メンバーに通知する。
/// user-left を先に送り、ホストが移譲された場合は host-changed を続けて送る。
pub(crate) async fn broadcast_departure(
    message_pusher: &Arc<dyn MessagePusher>,
    outcome: &LeaveOutcome,
) {
    if outcome.remaining.is_empty() {
        return;
    }

    let targets: Vec<_> = outcome
        .remaining
        .iter()
        .map(|p: &Participant| p.connection_id.clone())
        .collect();

    let left_event = ServerEvent::UserLeft {
        user_id: outcome.departed.user_id.as_str().to_string(),
    };
    let left_json = serde_json::to_string(&left_event).unwrap();
    if let Err(e) = message_pusher.broadcast(&targets, &left_json).await {
        tracing::warn!("Failed to broadcast user-left: {}", e);
    }

    if let Some(new_host) = &outcome.new_host {
        let host_event = ServerEvent::HostChanged {
            host_user_id: new_host.as_str().to_string(),
        };
        let host_json = serde_json::to_string(&host_event).unwrap();
        if let Err(e) = message_pusher.broadcast(&targets, &host_json).await {
            tracing::warn!("Failed to broadcast host-changed: {}", e);
        }
        tracing::info!(
            "Host migrated from '{}' to '{}'",
            outcome.departed.user_id.as_str(),
            new_host.as_str()
        );
    }
}
