//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - ルーム参加処理（スナップショット配送、既存メンバーへの通知、BAN 拒否）
//!
//! ### なぜこのテストが必要か
//! - 参加者が受け取るスナップショットが「その時点のルームの真実」であることを保証
//! - user-joined が参加者本人に送られないことを保証
//! - BAN 済みユーザが入室できず、既存メンバーに何も通知されないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規ルームの作成、既存ルームへの参加
//! - 正常系：切断からの再参加（通知なしでスナップショットを再配送）
//! - 異常系：BAN 済みユーザの参加試行

use std::sync::Arc;

use crate::domain::{
    ConnectionId, JoinOutcome, MessagePusher, RoomId, RoomRegistry, RoomSnapshot, UserId, Username,
};
use crate::infrastructure::dto::websocket::ServerEvent;

use super::disconnect::DisconnectWatchdog;

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Registry（ルーム状態管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 切断猶予タイマーの管理
    watchdog: Arc<DisconnectWatchdog>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        watchdog: Arc<DisconnectWatchdog>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            watchdog,
        }
    }

    /// ルーム参加を実行
    ///
    /// # Returns
    ///
    /// Registry の JoinOutcome をそのまま返す。ハンドラは Denied 以外の場合に
    /// 接続をこのルーム・ユーザに紐付ける。
    pub async fn execute(
        &self,
        room_id: RoomId,
        user_id: UserId,
        username: Username,
        connection_id: ConnectionId,
    ) -> JoinOutcome {
        // 1. 切断猶予タイマーが動いていれば止める（再接続のケース）
        self.watchdog.cancel(&room_id, &user_id).await;

        // 2. Registry に参加させる
        let outcome = self
            .registry
            .join(room_id, user_id.clone(), username, connection_id.clone())
            .await;

        // 3. 結果に応じて通知する
        match &outcome {
            JoinOutcome::Joined { snapshot, others } => {
                self.push_snapshot(&connection_id, snapshot).await;

                // 既存メンバーに新メンバーの参加を知らせる
                let joined_event = match snapshot.participants.iter().find(|p| p.user_id == user_id)
                {
                    Some(joiner) => ServerEvent::UserJoined {
                        user_id: joiner.user_id.as_str().to_string(),
                        username: joiner.username.as_str().to_string(),
                    },
                    None => return outcome,
                };
                let joined_json = serde_json::to_string(&joined_event).unwrap();
                let targets: Vec<ConnectionId> =
                    others.iter().map(|p| p.connection_id.clone()).collect();
                if let Err(e) = self.message_pusher.broadcast(&targets, &joined_json).await {
                    tracing::warn!("Failed to broadcast user-joined: {}", e);
                }
            }
            JoinOutcome::Rejoined { snapshot } => {
                // 再接続では既存メンバーへの通知は出さず、スナップショットだけを再配送する
                self.push_snapshot(&connection_id, snapshot).await;
            }
            JoinOutcome::Denied { reason } => {
                let denied_event = ServerEvent::JoinDenied {
                    reason: reason.message().to_string(),
                };
                let denied_json = serde_json::to_string(&denied_event).unwrap();
                if let Err(e) = self.message_pusher.push_to(&connection_id, &denied_json).await {
                    tracing::warn!("Failed to push join-denied: {}", e);
                }
            }
        }

        outcome
    }

    /// 参加者本人に room-joined と comment:init を送る
    async fn push_snapshot(&self, connection_id: &ConnectionId, snapshot: &RoomSnapshot) {
        let room_joined = ServerEvent::RoomJoined {
            room_id: snapshot.room_id.as_str().to_string(),
            code: snapshot.code.clone(),
            language: snapshot.language,
            users: snapshot
                .participants
                .iter()
                .cloned()
                .map(Into::into)
                .collect(),
            host_user_id: snapshot.host_user_id.as_str().to_string(),
        };
        let room_joined_json = serde_json::to_string(&room_joined).unwrap();
        if let Err(e) = self
            .message_pusher
            .push_to(connection_id, &room_joined_json)
            .await
        {
            tracing::warn!("Failed to push room-joined: {}", e);
            return;
        }

        let comment_init = ServerEvent::CommentInit {
            comments: snapshot.comments.iter().cloned().map(Into::into).collect(),
        };
        let comment_init_json = serde_json::to_string(&comment_init).unwrap();
        if let Err(e) = self
            .message_pusher
            .push_to(connection_id, &comment_init_json)
            .await
        {
            tracing::warn!("Failed to push comment:init: {}", e);
        }
    }
}
