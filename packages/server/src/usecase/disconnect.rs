//! UseCase: 切断処理（猶予タイマー付き）
//!
//! WebSocket 切断を即座に退出扱いにせず、猶予期間内の再接続を待つ。
//! 猶予期間内に同じユーザが再参加した場合、タイマーはキャンセルされ
//! メンバーシップは維持される（他メンバーへの通知も発生しない）。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectWatchdog のタイマー満了・キャンセル・再スケジュール
//! - DisconnectUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 猶予満了後にのみ退出処理が走ることを保証
//! - 再参加（cancel 経由・新接続経由の両方）で退出が抑止されることを保証
//! - 二重スケジュールが二重退出にならないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：猶予満了による退出と通知、再接続によるキャンセル
//! - エッジケース：猶予中の新接続での再参加（古いタイマーは空振りする）、
//!   ホストの切断によるホスト移譲

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::domain::{ConnectionId, MessagePusher, RoomId, RoomRegistry, UserId};
use crate::usecase::leave_room::broadcast_departure;

/// 保留中の退出タイマー
struct PendingRemoval {
    /// スケジュール世代。fire 時にこの値が一致する場合のみ退出を実行する
    generation: u64,
    handle: JoinHandle<()>,
}

/// 切断されたメンバーの退出を猶予期間だけ遅延させるタイマー管理。
/// (ルーム, ユーザ) ごとに高々 1 つのタイマーを保持する。
pub struct DisconnectWatchdog {
    grace: Duration,
    pending: Mutex<HashMap<(RoomId, UserId), PendingRemoval>>,
    counter: AtomicU64,
}

impl DisconnectWatchdog {
    /// 新しい DisconnectWatchdog を作成
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            pending: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(0),
        }
    }

    /// 猶予期間後の退出をスケジュールする。
    /// 同じ (ルーム, ユーザ) のタイマーが既にある場合は何もしない。
    pub async fn schedule(
        self: &Arc<Self>,
        registry: Arc<dyn RoomRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        room_id: RoomId,
        user_id: UserId,
        connection_id: ConnectionId,
    ) {
        let key = (room_id.clone(), user_id.clone());
        let mut pending = self.pending.lock().await;
        if pending.contains_key(&key) {
            return;
        }

        let generation = self.counter.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "Scheduled removal of '{}' from room '{}' in {:?}",
            user_id.as_str(),
            room_id.as_str(),
            self.grace
        );

        // タイマーはロック保持中に起動する。fire の先頭が同じロック取得なので、
        // 猶予 0 でも挿入前に発火が進むことはない。
        let watchdog = Arc::clone(self);
        let grace = self.grace;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            watchdog
                .fire(registry, message_pusher, room_id, user_id, connection_id, generation)
                .await;
        });

        pending.insert(key, PendingRemoval { generation, handle });
    }

    /// 保留中のタイマーを取り消す（再参加時に呼ばれる）
    pub async fn cancel(&self, room_id: &RoomId, user_id: &UserId) {
        let key = (room_id.clone(), user_id.clone());
        let mut pending = self.pending.lock().await;
        if let Some(removal) = pending.remove(&key) {
            removal.handle.abort();
            tracing::debug!(
                "Cancelled pending removal of '{}' from room '{}'",
                user_id.as_str(),
                room_id.as_str()
            );
        }
    }

    /// 猶予満了時の退出処理。世代が一致するエントリを取り除いてから退出させる。
    /// 切断時と同じ接続のままの場合にのみ退出が成立する。
    async fn fire(
        &self,
        registry: Arc<dyn RoomRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        room_id: RoomId,
        user_id: UserId,
        connection_id: ConnectionId,
        generation: u64,
    ) {
        {
            let mut pending = self.pending.lock().await;
            let key = (room_id.clone(), user_id.clone());
            match pending.get(&key) {
                Some(removal) if removal.generation == generation => {
                    pending.remove(&key);
                }
                _ => return,
            }
        }

        let Some(outcome) = registry
            .leave_if_connection(&room_id, &user_id, &connection_id)
            .await
        else {
            tracing::debug!(
                "Removal of '{}' from room '{}' skipped (reconnected or already gone)",
                user_id.as_str(),
                room_id.as_str()
            );
            return;
        };

        tracing::info!(
            "Grace expired: removed '{}' from room '{}'",
            user_id.as_str(),
            room_id.as_str()
        );
        if outcome.room_removed {
            tracing::info!("Room '{}' removed (last member left)", room_id.as_str());
        }

        broadcast_departure(&message_pusher, &outcome).await;
    }
}

/// 切断処理のユースケース
pub struct DisconnectUseCase {
    /// Registry（ルーム状態管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 退出猶予タイマー
    watchdog: Arc<DisconnectWatchdog>,
}

impl DisconnectUseCase {
    /// 新しい DisconnectUseCase を作成
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

    /// 切断されたメンバーの退出をスケジュールする
    pub async fn execute(&self, room_id: RoomId, user_id: UserId, connection_id: ConnectionId) {
        self.watchdog
            .schedule(
                self.registry.clone(),
                self.message_pusher.clone(),
                room_id,
                user_id,
                connection_id,
            )
            .await;
    }
}
