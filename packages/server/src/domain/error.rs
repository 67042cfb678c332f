//! ドメイン層のエラー定義

use thiserror::Error;

/// 値オブジェクトの生成時に発生する検証エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("room id must not be empty")]
    EmptyRoomId,

    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("username must not be empty")]
    EmptyUsername,

    #[error("comment id must not be empty")]
    EmptyCommentId,

    #[error("unknown language: '{0}'")]
    UnknownLanguage(String),
}

/// Room エンティティの状態遷移で発生するエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("user '{0}' is already a member")]
    AlreadyMember(String),

    #[error("user '{0}' is not a member")]
    NotMember(String),

    #[error("user '{0}' is not the host")]
    NotHost(String),

    #[error("host '{0}' cannot kick themself")]
    SelfKick(String),

    #[error("comment '{0}' not found")]
    CommentNotFound(String),

    #[error("an execution is already in progress")]
    ExecutionInFlight,
}

/// RoomRegistry の操作で発生するエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error(transparent)]
    Room(#[from] RoomError),
}

/// メッセージ送信（通知）で発生するエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessagePushError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("failed to push message to connection '{0}'")]
    PushFailed(String),
}

/// コード実行プロバイダ呼び出しで発生するエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// プロバイダには到達したが、実行が拒否された（メッセージはプロバイダ由来）
    #[error("execution rejected: {0}")]
    Rejected(String),

    /// プロバイダに到達できなかった（タイムアウト・通信障害・不正な応答）
    #[error("execution provider unavailable: {0}")]
    Unavailable(String),
}
