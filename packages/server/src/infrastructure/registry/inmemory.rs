//! InMemory Room Registry 実装
//!
//! ドメイン層が定義する RoomRegistry trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## 排他制御
//!
//! 全ルームと BAN リストを単一の Mutex で保護し、
//! 1 つの状態遷移（メソッド呼び出し）ごとに 1 回だけロックを取得します。
//! 遷移とその通知先の解決を同じロック区間で行うため、
//! 「遷移後・通知前」に別の遷移が割り込んでも通知先がずれません。
//!
//! ## 技術的負債
//!
//! 現在、ドメインモデル（`Room`）を直接ストレージとして使用しています。
//! これは InMemory 実装では許容される妥協ですが、将来 Redis などで
//! ルームを永続化する際は、DTO を挟む変換層が必要になります。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use kobo_shared::time::Clock;

use crate::domain::{
    Admission, CommentAddOutcome, CommentFlagOutcome, CommentId, CommentReplyOutcome,
    ConnectionId, DeniedReason, JoinOutcome, KickOutcome, Language, LeaveOutcome, Participant,
    RegistryError, Room, RoomError, RoomId, RoomRegistry, RoomSnapshot, RoomSummary, SyncOutcome,
    Timestamp, TransferOutcome, UserId, Username,
};

/// ロック 1 回で守る Registry の全状態
///
/// ルームと BAN リストは寿命が異なるため別のマップで持つ。
/// ルームは空になった時点で消えるが、BAN リストはプロセスが
/// 生きている限り残り、同名ルームを作り直しても引き継がれる。
#[derive(Default)]
struct RegistryState {
    /// Room ドメインモデル（Key: RoomId）
    rooms: HashMap<RoomId, Room>,
    /// ルームごとの BAN 済みユーザ
    banned: HashMap<RoomId, HashSet<UserId>>,
}

/// インメモリ Room Registry 実装
///
/// Room ドメインモデルを保持し、ドメイン層の RoomRegistry trait を実装します（依存性の逆転）。
/// タイムスタンプ（参加時刻・ルーム作成時刻・コメント作成時刻）はすべて
/// 注入された Clock から払い出します。
pub struct InMemoryRoomRegistry {
    state: Mutex<RegistryState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRegistry {
    /// 新しい InMemoryRoomRegistry を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    fn room_not_found(room_id: &RoomId) -> RegistryError {
        RegistryError::RoomNotFound(room_id.as_str().to_string())
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn join(
        &self,
        room_id: RoomId,
        user_id: UserId,
        username: Username,
        connection_id: ConnectionId,
    ) -> JoinOutcome {
        let now = self.now();
        let mut state = self.state.lock().await;

        // BAN 済みユーザはルームを作らせずに拒否する（状態は一切変えない）
        if state
            .banned
            .get(&room_id)
            .is_some_and(|set| set.contains(&user_id))
        {
            return JoinOutcome::Denied {
                reason: DeniedReason::Banned,
            };
        }

        match state.rooms.get_mut(&room_id) {
            Some(room) => match room.admit(user_id.clone(), username, connection_id, now) {
                Admission::Reconnected => JoinOutcome::Rejoined {
                    snapshot: room.snapshot(),
                },
                Admission::Joined => JoinOutcome::Joined {
                    snapshot: room.snapshot(),
                    others: room.members_except(&user_id),
                },
            },
            None => {
                // ルームが存在しなければ作成し、最初の参加者をホストにする
                let founder = Participant::new(user_id, username, connection_id, now);
                let room = Room::new(room_id.clone(), founder, now);
                let snapshot = room.snapshot();
                state.rooms.insert(room_id, room);
                JoinOutcome::Joined {
                    snapshot,
                    others: Vec::new(),
                }
            }
        }
    }

    async fn leave(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<LeaveOutcome, RegistryError> {
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| Self::room_not_found(room_id))?;

        let departure = room.remove_member(user_id)?;
        let remaining = room.participants.clone();
        let room_removed = room.is_empty();
        if room_removed {
            // 空になったルームは即座に破棄する。BAN リストは残す。
            state.rooms.remove(room_id);
        }

        Ok(LeaveOutcome {
            departed: departure.departed,
            new_host: departure.new_host,
            remaining,
            room_removed,
        })
    }

    async fn leave_if_connection(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        connection_id: &ConnectionId,
    ) -> Option<LeaveOutcome> {
        let mut state = self.state.lock().await;
        let room = state.rooms.get_mut(room_id)?;

        // 別の接続で再参加済みなら何もしない（猶予タイマーの誤発火を防ぐ）
        let current_connection = room.connection_of(user_id)?;
        if &current_connection != connection_id {
            return None;
        }

        let departure = room.remove_member(user_id).ok()?;
        let remaining = room.participants.clone();
        let room_removed = room.is_empty();
        if room_removed {
            state.rooms.remove(room_id);
        }

        Some(LeaveOutcome {
            departed: departure.departed,
            new_host: departure.new_host,
            remaining,
            room_removed,
        })
    }

    async fn kick(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        target: &UserId,
    ) -> Result<KickOutcome, RegistryError> {
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| Self::room_not_found(room_id))?;

        let kicked = room.kick_member(actor, target)?;
        let remaining = room.participants.clone();
        // BAN 登録と退出を同じロック区間で行う
        state
            .banned
            .entry(room_id.clone())
            .or_default()
            .insert(kicked.user_id.clone());

        Ok(KickOutcome {
            target: kicked,
            remaining,
        })
    }

    async fn transfer_host(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        new_host: &UserId,
    ) -> Result<TransferOutcome, RegistryError> {
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| Self::room_not_found(room_id))?;

        room.transfer_host(actor, new_host)?;
        Ok(TransferOutcome {
            new_host_user_id: new_host.clone(),
            members: room.participants.clone(),
        })
    }

    async fn update_code(
        &self,
        room_id: &RoomId,
        editor: &UserId,
        code: String,
    ) -> Result<SyncOutcome, RegistryError> {
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| Self::room_not_found(room_id))?;

        room.set_code(editor, code)?;
        Ok(SyncOutcome {
            others: room.members_except(editor),
        })
    }

    async fn update_language(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        language: Language,
    ) -> Result<SyncOutcome, RegistryError> {
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| Self::room_not_found(room_id))?;

        room.set_language(actor, language)?;
        Ok(SyncOutcome {
            others: room.members_except(actor),
        })
    }

    async fn begin_execution(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        code: String,
        language: Language,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| Self::room_not_found(room_id))?;

        room.begin_execution(actor, code, language)?;
        Ok(())
    }

    async fn finish_execution(
        &self,
        room_id: &RoomId,
    ) -> Result<Vec<Participant>, RegistryError> {
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| Self::room_not_found(room_id))?;

        room.finish_execution();
        Ok(room.participants.clone())
    }

    async fn add_comment(
        &self,
        room_id: &RoomId,
        author: &UserId,
        line_number: u32,
        message: String,
    ) -> Result<CommentAddOutcome, RegistryError> {
        let now = self.now();
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| Self::room_not_found(room_id))?;

        let comment = room.add_comment(author, line_number, message, now)?;
        Ok(CommentAddOutcome {
            comment,
            members: room.participants.clone(),
        })
    }

    async fn add_reply(
        &self,
        room_id: &RoomId,
        author: &UserId,
        comment_id: &CommentId,
        message: String,
    ) -> Result<CommentReplyOutcome, RegistryError> {
        let now = self.now();
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| Self::room_not_found(room_id))?;

        let reply = room.add_reply(author, comment_id, message, now)?;
        Ok(CommentReplyOutcome {
            comment_id: comment_id.clone(),
            reply,
            members: room.participants.clone(),
        })
    }

    async fn set_comment_resolved(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        comment_id: &CommentId,
        resolved: bool,
    ) -> Result<CommentFlagOutcome, RegistryError> {
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| Self::room_not_found(room_id))?;

        room.set_comment_resolved(actor, comment_id, resolved)?;
        Ok(CommentFlagOutcome {
            comment_id: comment_id.clone(),
            members: room.participants.clone(),
        })
    }

    async fn peers(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<Vec<Participant>, RegistryError> {
        let state = self.state.lock().await;
        let room = state
            .rooms
            .get(room_id)
            .ok_or_else(|| Self::room_not_found(room_id))?;

        if !room.is_member(user_id) {
            return Err(RoomError::NotMember(user_id.as_str().to_string()).into());
        }
        Ok(room.members_except(user_id))
    }

    async fn connection_of(&self, room_id: &RoomId, user_id: &UserId) -> Option<ConnectionId> {
        let state = self.state.lock().await;
        state
            .rooms
            .get(room_id)
            .and_then(|room| room.connection_of(user_id))
    }

    async fn list_rooms(&self) -> Vec<RoomSummary> {
        let state = self.state.lock().await;
        let mut summaries: Vec<RoomSummary> = state.rooms.values().map(Room::summary).collect();
        // HashMap の列挙順は不定なので、レスポンスを安定させるためにソートする
        summaries.sort_by(|a, b| a.room_id.as_str().cmp(b.room_id.as_str()));
        summaries
    }

    async fn snapshot(&self, room_id: &RoomId) -> Result<RoomSnapshot, RegistryError> {
        let state = self.state.lock().await;
        let room = state
            .rooms
            .get(room_id)
            .ok_or_else(|| Self::room_not_found(room_id))?;
        Ok(room.snapshot())
    }
}
