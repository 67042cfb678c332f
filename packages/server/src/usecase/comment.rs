//! UseCase: 行コメントスレッド（作成・返信・解決）
//!
//! コメントはルームの行番号に紐づくスレッドとして保持され、全メンバーへ
//! ブロードキャストされる。作成者の表示名はクライアントの申告ではなく
//! メンバーシップから刻印する。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - CommentUseCase::add() / reply() / set_resolved() メソッド
//!
//! ### なぜこのテストが必要か
//! - コメント操作が作成者を含む全メンバーに届くことを保証
//! - 作成者情報がメンバーシップから刻印されることを保証
//! - 非メンバーの操作・存在しないスレッドへの返信が拒否されることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：スレッド作成、返信、解決と解除
//! - 異常系：非メンバーの操作、存在しないスレッド ID

use std::sync::Arc;

use crate::domain::{
    CommentId, MessagePusher, Participant, RegistryError, RoomId, RoomRegistry, UserId,
};
use crate::infrastructure::dto::websocket::ServerEvent;

/// コメントスレッド操作のユースケース
pub struct CommentUseCase {
    /// Registry（ルーム状態管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl CommentUseCase {
    /// 新しい CommentUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// コメントスレッドを作成し、全メンバーへ通知する（メンバー専用）
    pub async fn add(
        &self,
        room_id: &RoomId,
        author: &UserId,
        line_number: u32,
        message: String,
    ) -> Result<(), RegistryError> {
        // 1. Registry でスレッドを作成する（ID 採番・作成者の刻印は Registry 側）
        let outcome = self
            .registry
            .add_comment(room_id, author, line_number, message)
            .await?;

        // 2. 作成者を含む全メンバーへ通知する
        let event = ServerEvent::CommentAdded {
            comment: outcome.comment.into(),
        };
        self.broadcast(&outcome.members, &event).await;
        Ok(())
    }

    /// コメントスレッドへ返信し、全メンバーへ通知する（メンバー専用）
    pub async fn reply(
        &self,
        room_id: &RoomId,
        author: &UserId,
        comment_id: &CommentId,
        message: String,
    ) -> Result<(), RegistryError> {
        let outcome = self
            .registry
            .add_reply(room_id, author, comment_id, message)
            .await?;

        let event = ServerEvent::CommentReplied {
            comment_id: outcome.comment_id.as_str().to_string(),
            reply: outcome.reply.into(),
        };
        self.broadcast(&outcome.members, &event).await;
        Ok(())
    }

    /// コメントスレッドの resolved フラグを設定し、全メンバーへ通知する（メンバー専用）
    pub async fn set_resolved(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        comment_id: &CommentId,
        resolved: bool,
    ) -> Result<(), RegistryError> {
        let outcome = self
            .registry
            .set_comment_resolved(room_id, actor, comment_id, resolved)
            .await?;

        let comment_id = outcome.comment_id.as_str().to_string();
        let event = if resolved {
            ServerEvent::CommentResolved { comment_id }
        } else {
            ServerEvent::CommentUnresolved { comment_id }
        };
        self.broadcast(&outcome.members, &event).await;
        Ok(())
    }

    async fn broadcast(&self, members: &[Participant], event: &ServerEvent) {
        let targets: Vec<_> = members.iter().map(|p| p.connection_id.clone()).collect();
        let json = serde_json::to_string(event).unwrap();
        if let Err(e) = self.message_pusher.broadcast(&targets, &json).await {
            tracing::warn!("Failed to broadcast comment event: {}", e);
        }
    }
}
