//! UseCase: ホスト権限の移譲
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - TransferHostUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 移譲が全メンバー（新旧ホスト含む）に host-changed として届くことを保証
//! - 非ホスト・非メンバー宛の移譲が拒否されることを保証
//! - 移譲後にホスト専用操作の権限が移っていることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：ホストによる移譲と通知
//! - 異常系：非ホストの移譲依頼、非メンバーへの移譲

use std::sync::Arc;

use crate::domain::{MessagePusher, RegistryError, RoomId, RoomRegistry, UserId};
use crate::infrastructure::dto::websocket::ServerEvent;

/// ホスト移譲のユースケース
pub struct TransferHostUseCase {
    /// Registry（ルーム状態管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl TransferHostUseCase {
    /// 新しい TransferHostUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// ホスト権限を移譲し、全メンバーへ通知する（ホスト専用）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        new_host: &UserId,
    ) -> Result<(), RegistryError> {
        // 1. Registry で移譲する（ホスト検証・メンバー検証は Registry 側で行う）
        let outcome = self.registry.transfer_host(room_id, actor, new_host).await?;

        tracing::info!(
            "Host of room '{}' transferred from '{}' to '{}'",
            room_id.as_str(),
            actor.as_str(),
            outcome.new_host_user_id.as_str()
        );

        // 2. 旧ホストを含む全メンバーへ通知する
        let targets: Vec<_> = outcome
            .members
            .iter()
            .map(|p| p.connection_id.clone())
            .collect();
        let event = ServerEvent::HostChanged {
            host_user_id: outcome.new_host_user_id.as_str().to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        if let Err(e) = self.message_pusher.broadcast(&targets, &json).await {
            tracing::warn!("Failed to broadcast host-changed: {}", e);
        }
        Ok(())
    }
}
