//! UseCase: メンバーの追放
//!
//! 追放は退出と BAN 登録を 1 回の遷移で行う。BAN はプロセスが生きている間
//! ずっと有効で、対象ユーザの再入室は join-denied で拒否される。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - KickUserUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 追放対象に kicked が先に届き、残存メンバーに user-left が届くことを保証
//! - 追放されたユーザの再入室が拒否されることを保証
//! - 非ホストの追放・ホスト自身の追放が拒否されることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：ホストによる追放と通知、追放後の再入室拒否
//! - 異常系：非ホストの追放依頼、自分自身の追放、非メンバーの追放

use std::sync::Arc;

use crate::domain::{MessagePusher, RegistryError, RoomId, RoomRegistry, UserId};
use crate::infrastructure::dto::websocket::ServerEvent;

/// 追放対象のクライアントへ送る理由の文言
pub const KICKED_REASON: &str = "You were removed by the host";

/// メンバー追放のユースケース
pub struct KickUserUseCase {
    /// Registry（ルーム状態管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl KickUserUseCase {
    /// 新しい KickUserUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// メンバーを追放し、本人と残存メンバーへ通知する（ホスト専用）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        target: &UserId,
    ) -> Result<(), RegistryError> {
        // 1. Registry で追放する（ホスト検証・自己追放の拒否は Registry 側で行う）
        let outcome = self.registry.kick(room_id, actor, target).await?;

        tracing::info!(
            "User '{}' kicked from room '{}' by host '{}'",
            target.as_str(),
            room_id.as_str(),
            actor.as_str()
        );

        // 2. 本人へ先に kicked を送る（クライアントはこれを受けて切断する）
        let kicked = ServerEvent::Kicked {
            room_id: room_id.as_str().to_string(),
            reason: KICKED_REASON.to_string(),
        };
        let kicked_json = serde_json::to_string(&kicked).unwrap();
        if let Err(e) = self
            .message_pusher
            .push_to(&outcome.target.connection_id, &kicked_json)
            .await
        {
            // 本人が先に切断していても追放自体は成立している
            tracing::warn!("Failed to push kicked: {}", e);
        }

        // 3. 残存メンバーへ user-left を送る。追放対象はホストではないので
        //    ホスト移譲は発生しない
        if outcome.remaining.is_empty() {
            return Ok(());
        }
        let targets: Vec<_> = outcome
            .remaining
            .iter()
            .map(|p| p.connection_id.clone())
            .collect();
        let left = ServerEvent::UserLeft {
            user_id: outcome.target.user_id.as_str().to_string(),
        };
        let left_json = serde_json::to_string(&left).unwrap();
        if let Err(e) = self.message_pusher.broadcast(&targets, &left_json).await {
            tracing::warn!("Failed to broadcast user-left: {}", e);
        }
        Ok(())
    }
}
