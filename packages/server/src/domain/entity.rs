//! エンティティ定義
//!
//! コードルームのドメインモデル。状態遷移はすべて Room のメソッドとして実装し、
//! 1 回のメソッド呼び出しが 1 つの遷移に対応するようにします。
//! 排他制御（ロック）は Infrastructure 層の Registry 実装が担います。

use super::error::RoomError;
use super::value_object::{
    CommentId, ConnectionId, Language, ReplyId, RoomId, Timestamp, UserId, Username,
};

/// ルームの参加者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user_id: UserId,
    pub username: Username,
    /// 現在この参加者に紐付いている WebSocket 接続。
    /// 再接続のたびに差し替わる。
    pub connection_id: ConnectionId,
    pub joined_at: Timestamp,
}

impl Participant {
    pub fn new(
        user_id: UserId,
        username: Username,
        connection_id: ConnectionId,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            user_id,
            username,
            connection_id,
            joined_at,
        }
    }
}

/// コメントスレッドへの返信
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub id: ReplyId,
    pub author_id: UserId,
    pub author_name: Username,
    pub message: String,
    pub created_at: Timestamp,
}

/// 行に紐付くコメントスレッド
///
/// スレッドは追記専用で、編集も削除もできない。
/// `line_number` は作成時点の行番号で、コードが変わっても追従しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThread {
    pub id: CommentId,
    pub line_number: u32,
    pub author_id: UserId,
    pub author_name: Username,
    pub message: String,
    pub created_at: Timestamp,
    pub resolved: bool,
    pub replies: Vec<Reply>,
}

impl CommentThread {
    fn new(
        line_number: u32,
        author_id: UserId,
        author_name: Username,
        message: String,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: CommentId::generate(),
            line_number,
            author_id,
            author_name,
            message,
            created_at,
            resolved: false,
            replies: Vec::new(),
        }
    }
}

/// join の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// 新規メンバーとして参加した
    Joined,
    /// 既存メンバーが接続を張り直した（user-joined は通知しない）
    Reconnected,
}

/// メンバー削除の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub departed: Participant,
    /// 削除されたメンバーがホストだった場合の新ホスト
    pub new_host: Option<UserId>,
}

/// ルームの状態のコピー（参加直後のスナップショット送信や HTTP API 向け）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub code: String,
    pub language: Language,
    pub host_user_id: UserId,
    pub participants: Vec<Participant>,
    pub comments: Vec<CommentThread>,
    pub created_at: Timestamp,
}

/// ルーム一覧 API 向けの要約
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub participant_user_ids: Vec<UserId>,
    pub language: Language,
    pub host_user_id: UserId,
    pub created_at: Timestamp,
}

/// コードルーム
///
/// メンバーは参加順で保持する。ホストが退出したときは
/// 最も古い残存メンバー（Vec の先頭）がホストを引き継ぐ。
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub code: String,
    pub language: Language,
    pub host_user_id: UserId,
    pub participants: Vec<Participant>,
    pub comments: Vec<CommentThread>,
    pub created_at: Timestamp,
    execution_in_flight: bool,
}

impl Room {
    /// 最初の参加者がルームを作る。作成者がホストになる。
    pub fn new(id: RoomId, founder: Participant, created_at: Timestamp) -> Self {
        Self {
            id,
            code: String::new(),
            language: Language::default(),
            host_user_id: founder.user_id.clone(),
            participants: vec![founder],
            comments: Vec::new(),
            created_at,
            execution_in_flight: false,
        }
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.participants.iter().any(|p| &p.user_id == user_id)
    }

    pub fn is_host(&self, user_id: &UserId) -> bool {
        &self.host_user_id == user_id
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn is_executing(&self) -> bool {
        self.execution_in_flight
    }

    pub fn member(&self, user_id: &UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.user_id == user_id)
    }

    pub fn connection_of(&self, user_id: &UserId) -> Option<ConnectionId> {
        self.member(user_id).map(|p| p.connection_id.clone())
    }

    /// 指定ユーザ以外の全メンバー
    pub fn members_except(&self, user_id: &UserId) -> Vec<Participant> {
        self.participants
            .iter()
            .filter(|p| &p.user_id != user_id)
            .cloned()
            .collect()
    }

    /// 入室処理。既存メンバーなら接続の差し替えだけ行う。
    ///
    /// 再接続時に username は更新しない（初回参加時の表示名を維持する）。
    pub fn admit(
        &mut self,
        user_id: UserId,
        username: Username,
        connection_id: ConnectionId,
        joined_at: Timestamp,
    ) -> Admission {
        if let Some(member) = self.participants.iter_mut().find(|p| p.user_id == user_id) {
            member.connection_id = connection_id;
            return Admission::Reconnected;
        }
        self.participants
            .push(Participant::new(user_id, username, connection_id, joined_at));
        Admission::Joined
    }

    /// メンバーを削除する。削除対象がホストで残存メンバーがいる場合、
    /// 最も古い残存メンバーにホストを引き継ぐ。
    pub fn remove_member(&mut self, user_id: &UserId) -> Result<Departure, RoomError> {
        let index = self
            .participants
            .iter()
            .position(|p| &p.user_id == user_id)
            .ok_or_else(|| RoomError::NotMember(user_id.as_str().to_string()))?;
        let departed = self.participants.remove(index);

        let new_host = if departed.user_id == self.host_user_id && !self.participants.is_empty() {
            self.host_user_id = self.participants[0].user_id.clone();
            Some(self.host_user_id.clone())
        } else {
            None
        };

        Ok(Departure { departed, new_host })
    }

    /// ホストがメンバーを追放する
    pub fn kick_member(
        &mut self,
        actor: &UserId,
        target: &UserId,
    ) -> Result<Participant, RoomError> {
        if !self.is_host(actor) {
            return Err(RoomError::NotHost(actor.as_str().to_string()));
        }
        if actor == target {
            return Err(RoomError::SelfKick(actor.as_str().to_string()));
        }
        if !self.is_member(target) {
            return Err(RoomError::NotMember(target.as_str().to_string()));
        }

        // 追放対象はホストではないので、ホスト移譲は発生しない
        let departure = self.remove_member(target)?;
        Ok(departure.departed)
    }

    /// ホスト権限を別のメンバーに移す
    pub fn transfer_host(&mut self, actor: &UserId, new_host: &UserId) -> Result<(), RoomError> {
        if !self.is_host(actor) {
            return Err(RoomError::NotHost(actor.as_str().to_string()));
        }
        if !self.is_member(new_host) {
            return Err(RoomError::NotMember(new_host.as_str().to_string()));
        }
        self.host_user_id = new_host.clone();
        Ok(())
    }

    /// ドキュメント全体を置き換える（last write wins）
    pub fn set_code(&mut self, editor: &UserId, code: String) -> Result<(), RoomError> {
        if !self.is_member(editor) {
            return Err(RoomError::NotMember(editor.as_str().to_string()));
        }
        self.code = code;
        Ok(())
    }

    /// ルームの言語を切り替える（ホスト専用）
    pub fn set_language(&mut self, actor: &UserId, language: Language) -> Result<(), RoomError> {
        if !self.is_host(actor) {
            return Err(RoomError::NotHost(actor.as_str().to_string()));
        }
        self.language = language;
        Ok(())
    }

    /// コード実行を開始する（ホスト専用・ルームごとに直列化）。
    /// 実行対象のコードと言語をルームに反映してから in-flight フラグを立てる。
    pub fn begin_execution(
        &mut self,
        actor: &UserId,
        code: String,
        language: Language,
    ) -> Result<(), RoomError> {
        if !self.is_host(actor) {
            return Err(RoomError::NotHost(actor.as_str().to_string()));
        }
        if self.execution_in_flight {
            return Err(RoomError::ExecutionInFlight);
        }
        self.code = code;
        self.language = language;
        self.execution_in_flight = true;
        Ok(())
    }

    /// コード実行の完了を記録する（成否を問わず呼ぶ）
    pub fn finish_execution(&mut self) {
        self.execution_in_flight = false;
    }

    /// コメントスレッドを追加する。作成者情報はメンバー情報から写し取る。
    pub fn add_comment(
        &mut self,
        author: &UserId,
        line_number: u32,
        message: String,
        created_at: Timestamp,
    ) -> Result<CommentThread, RoomError> {
        let member = self
            .member(author)
            .ok_or_else(|| RoomError::NotMember(author.as_str().to_string()))?;
        let thread = CommentThread::new(
            line_number,
            member.user_id.clone(),
            member.username.clone(),
            message,
            created_at,
        );
        self.comments.push(thread.clone());
        Ok(thread)
    }

    /// 既存のコメントスレッドに返信を追加する
    pub fn add_reply(
        &mut self,
        author: &UserId,
        comment_id: &CommentId,
        message: String,
        created_at: Timestamp,
    ) -> Result<Reply, RoomError> {
        let (author_id, author_name) = {
            let member = self
                .member(author)
                .ok_or_else(|| RoomError::NotMember(author.as_str().to_string()))?;
            (member.user_id.clone(), member.username.clone())
        };
        let thread = self
            .comments
            .iter_mut()
            .find(|c| &c.id == comment_id)
            .ok_or_else(|| RoomError::CommentNotFound(comment_id.as_str().to_string()))?;
        let reply = Reply {
            id: ReplyId::generate(),
            author_id,
            author_name,
            message,
            created_at,
        };
        thread.replies.push(reply.clone());
        Ok(reply)
    }

    /// コメントスレッドの resolved フラグを設定する
    pub fn set_comment_resolved(
        &mut self,
        actor: &UserId,
        comment_id: &CommentId,
        resolved: bool,
    ) -> Result<(), RoomError> {
        if !self.is_member(actor) {
            return Err(RoomError::NotMember(actor.as_str().to_string()));
        }
        let thread = self
            .comments
            .iter_mut()
            .find(|c| &c.id == comment_id)
            .ok_or_else(|| RoomError::CommentNotFound(comment_id.as_str().to_string()))?;
        thread.resolved = resolved;
        Ok(())
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id.clone(),
            code: self.code.clone(),
            language: self.language,
            host_user_id: self.host_user_id.clone(),
            participants: self.participants.clone(),
            comments: self.comments.clone(),
            created_at: self.created_at,
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.id.clone(),
            participant_user_ids: self.participants.iter().map(|p| p.user_id.clone()).collect(),
            language: self.language,
            host_user_id: self.host_user_id.clone(),
            created_at: self.created_at,
        }
    }
}
