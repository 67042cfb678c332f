//! ルームレジストリのインターフェース定義
//!
//! 依存性逆転の原則（DIP）に基づき、Domain 層でインターフェースを定義し、
//! Infrastructure 層で実装します。Usecase 層はこのインターフェースにのみ依存し、
//! ルームの保持方法（インメモリかどうか）を知りません。
//!
//! 各メソッドは 1 つの状態遷移に対応し、実装側でルームごとの排他制御を行った上で
//! 遷移の結果（通知先メンバーを含む）をまとめて返します。呼び出し側が
//! 「遷移してから通知先を問い合わせる」形にすると遷移と問い合わせの間に
//! 状態が変わり得るため、このインターフェースでは許可しません。

use async_trait::async_trait;

use super::entity::{CommentThread, Participant, Reply, RoomSnapshot, RoomSummary};
use super::error::RegistryError;
use super::value_object::{CommentId, ConnectionId, Language, RoomId, UserId, Username};

/// 入室拒否の理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeniedReason {
    /// ホストに追放され、BAN リストに入っている
    Banned,
}

impl DeniedReason {
    pub fn message(&self) -> &'static str {
        match self {
            DeniedReason::Banned => "You were kicked from this room",
        }
    }
}

/// join の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// 新規メンバーとして参加した
    Joined {
        snapshot: RoomSnapshot,
        /// 参加者以外の既存メンバー（user-joined の通知先）
        others: Vec<Participant>,
    },
    /// 既存メンバーの再接続（既存メンバーへの通知は不要）
    Rejoined { snapshot: RoomSnapshot },
    /// 入室拒否
    Denied { reason: DeniedReason },
}

/// 退出の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub departed: Participant,
    /// 退出者がホストだった場合の新ホスト
    pub new_host: Option<UserId>,
    /// 退出後の残存メンバー（通知先）
    pub remaining: Vec<Participant>,
    /// 退出でルームが空になり、レジストリから削除された
    pub room_removed: bool,
}

/// 追放の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KickOutcome {
    pub target: Participant,
    /// 追放後の残存メンバー（user-left の通知先）
    pub remaining: Vec<Participant>,
}

/// ホスト移譲の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub new_host_user_id: UserId,
    /// 全メンバー（host-changed の通知先）
    pub members: Vec<Participant>,
}

/// ドキュメント更新（コード・言語）の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// 更新者以外の全メンバー（通知先）
    pub others: Vec<Participant>,
}

/// コメントスレッド作成の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentAddOutcome {
    pub comment: CommentThread,
    /// 全メンバー（comment:added の通知先）
    pub members: Vec<Participant>,
}

/// 返信追加の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentReplyOutcome {
    pub comment_id: CommentId,
    pub reply: Reply,
    pub members: Vec<Participant>,
}

/// resolved フラグ更新の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentFlagOutcome {
    pub comment_id: CommentId,
    pub members: Vec<Participant>,
}

/// ルームレジストリ
///
/// 全ルームの生成・参照・破棄と、ルーム内の状態遷移を司る。
/// ルームは最初の join で暗黙に作られ、最後のメンバーが抜けた時点で破棄される。
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// ルームに参加する。ルームが存在しなければ作成し、参加者をホストにする。
    async fn join(
        &self,
        room_id: RoomId,
        user_id: UserId,
        username: Username,
        connection_id: ConnectionId,
    ) -> JoinOutcome;

    /// ルームから退出する。ホストだった場合は最古参メンバーに移譲し、
    /// 空になったルームは削除する。
    async fn leave(&self, room_id: &RoomId, user_id: &UserId)
        -> Result<LeaveOutcome, RegistryError>;

    /// 切断猶予タイマー満了時の退出。ユーザの現在の接続が `connection_id` の
    /// ままである場合にのみ退出させる。別の接続で再参加済み・退出済み・
    /// ルーム削除済みの場合は何もせず None を返す。
    async fn leave_if_connection(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        connection_id: &ConnectionId,
    ) -> Option<LeaveOutcome>;

    /// メンバーを追放して BAN リストに追加する（ホスト専用）
    async fn kick(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        target: &UserId,
    ) -> Result<KickOutcome, RegistryError>;

    /// ホスト権限を移譲する（ホスト専用）
    async fn transfer_host(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        new_host: &UserId,
    ) -> Result<TransferOutcome, RegistryError>;

    /// ドキュメント全体を置き換える（メンバー専用・last write wins）
    async fn update_code(
        &self,
        room_id: &RoomId,
        editor: &UserId,
        code: String,
    ) -> Result<SyncOutcome, RegistryError>;

    /// ルームの言語を切り替える（ホスト専用）
    async fn update_language(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        language: Language,
    ) -> Result<SyncOutcome, RegistryError>;

    /// コード実行を開始する（ホスト専用）。実行中なら ExecutionInFlight を返す。
    async fn begin_execution(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        code: String,
        language: Language,
    ) -> Result<(), RegistryError>;

    /// コード実行の完了を記録し、結果の通知先（現在の全メンバー）を返す。
    /// 実行中にルームが消えていた場合は RoomNotFound を返す。
    async fn finish_execution(&self, room_id: &RoomId)
        -> Result<Vec<Participant>, RegistryError>;

    /// コメントスレッドを作成する（メンバー専用）
    async fn add_comment(
        &self,
        room_id: &RoomId,
        author: &UserId,
        line_number: u32,
        message: String,
    ) -> Result<CommentAddOutcome, RegistryError>;

    /// コメントスレッドに返信を追加する（メンバー専用）
    async fn add_reply(
        &self,
        room_id: &RoomId,
        author: &UserId,
        comment_id: &CommentId,
        message: String,
    ) -> Result<CommentReplyOutcome, RegistryError>;

    /// コメントスレッドの resolved フラグを設定する（メンバー専用）
    async fn set_comment_resolved(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        comment_id: &CommentId,
        resolved: bool,
    ) -> Result<CommentFlagOutcome, RegistryError>;

    /// 指定ユーザ以外の全メンバーを返す（カーソル位置の中継先の解決に使う）。
    /// 指定ユーザがメンバーでない場合は NotMember を返す。
    async fn peers(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<Vec<Participant>, RegistryError>;

    /// ユーザの現在の接続を返す（未参加なら None）
    async fn connection_of(&self, room_id: &RoomId, user_id: &UserId) -> Option<ConnectionId>;

    /// 全ルームの要約を返す
    async fn list_rooms(&self) -> Vec<RoomSummary>;

    /// ルームの状態のコピーを返す
    async fn snapshot(&self, room_id: &RoomId) -> Result<RoomSnapshot, RegistryError>;
}
