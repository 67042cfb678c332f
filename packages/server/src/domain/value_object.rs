//! 値オブジェクト定義
//!
//! ルーム ID やユーザ ID などの値オブジェクトを定義します。
//! 不正な値（空文字列など）はコンストラクタで弾き、
//! 以降の層では常に検証済みの値として扱えるようにします。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

/// ルームを識別する ID（最初の参加者が任意の文字列を指定する）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyRoomId);
        }
        Ok(Self(value))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザを識別する ID（クライアントが自己申告する）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyUserId);
        }
        Ok(Self(value))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 表示用のユーザ名（初回参加時に記録され、再接続では更新されない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Username {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        Ok(Self(value))
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// WebSocket 接続を識別する ID（サーバ側で採番する）
///
/// 同一ユーザが再接続すると新しい ConnectionId に差し替わり、
/// 古い接続はルーム宛のブロードキャスト対象から外れる。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// コメントスレッドを識別する ID（サーバ側で採番する）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommentId(String);

impl CommentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for CommentId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyCommentId);
        }
        Ok(Self(value))
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// コメントへの返信を識別する ID（サーバ側で採番する）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplyId(String);

impl ReplyId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ReplyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ルームで編集・実行できる言語
///
/// ワイヤ上の表記（serde）とコード実行プロバイダ側のエンジン名は別物なので、
/// プロバイダ向けの名前は [`Language::engine_id`] で引く。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Javascript,
    Python,
    Cpp,
    Java,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::Cpp => "cpp",
            Language::Java => "java",
        }
    }

    /// コード実行プロバイダが要求する言語識別子
    pub fn engine_id(&self) -> &'static str {
        match self {
            Language::Javascript => "nodejs",
            Language::Python => "python3",
            Language::Cpp => "cpp17",
            Language::Java => "java",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "javascript" => Ok(Language::Javascript),
            "python" => Ok(Language::Python),
            "cpp" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            other => Err(ValidationError::UnknownLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_room_id_accepts_non_empty_string() {
        // テスト項目: 空でない文字列から RoomId が生成できる
        // given (前提条件):
        let value = "room-1".to_string();

        // when (操作):
        let result = RoomId::try_from(value);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "room-1");
    }

    #[test]
    fn test_room_id_rejects_empty_string() {
        // テスト項目: 空文字列からは RoomId が生成できない
        // given (前提条件):
        let value = "".to_string();

        // when (操作):
        let result = RoomId::try_from(value);

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ValidationError::EmptyRoomId);
    }

    #[test]
    fn test_room_id_rejects_whitespace_only_string() {
        // テスト項目: 空白のみの文字列からは RoomId が生成できない
        // given (前提条件):
        let value = "   ".to_string();

        // when (操作):
        let result = RoomId::try_from(value);

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ValidationError::EmptyRoomId);
    }

    #[test]
    fn test_user_id_rejects_empty_string() {
        // テスト項目: 空文字列からは UserId が生成できない
        // given (前提条件):
        let value = "".to_string();

        // when (操作):
        let result = UserId::try_from(value);

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ValidationError::EmptyUserId);
    }

    #[test]
    fn test_username_rejects_empty_string() {
        // テスト項目: 空文字列からは Username が生成できない
        // given (前提条件):
        let value = "".to_string();

        // when (操作):
        let result = Username::try_from(value);

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ValidationError::EmptyUsername);
    }

    #[test]
    fn test_connection_id_generate_produces_unique_ids() {
        // テスト項目: generate が毎回異なる ConnectionId を生成する
        // given (前提条件):

        // when (操作):
        let id1 = ConnectionId::generate();
        let id2 = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_comment_id_generate_produces_unique_ids() {
        // テスト項目: generate が毎回異なる CommentId を生成する
        // given (前提条件):

        // when (操作):
        let id1 = CommentId::generate();
        let id2 = CommentId::generate();

        // then (期待する結果):
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_language_default_is_javascript() {
        // テスト項目: Language のデフォルト値が javascript である
        // given (前提条件):

        // when (操作):
        let language = Language::default();

        // then (期待する結果):
        assert_eq!(language, Language::Javascript);
    }

    #[test]
    fn test_language_engine_id_mapping() {
        // テスト項目: 各言語が正しいプロバイダ向けエンジン名に対応する
        // given (前提条件):

        // when (操作) / then (期待する結果):
        assert_eq!(Language::Javascript.engine_id(), "nodejs");
        assert_eq!(Language::Python.engine_id(), "python3");
        assert_eq!(Language::Cpp.engine_id(), "cpp17");
        assert_eq!(Language::Java.engine_id(), "java");
    }

    #[test]
    fn test_language_from_str_accepts_known_languages() {
        // テスト項目: 既知の言語名の文字列をパースできる
        // given (前提条件):

        // when (操作) / then (期待する結果):
        assert_eq!(Language::from_str("javascript").unwrap(), Language::Javascript);
        assert_eq!(Language::from_str("python").unwrap(), Language::Python);
        assert_eq!(Language::from_str("cpp").unwrap(), Language::Cpp);
        assert_eq!(Language::from_str("java").unwrap(), Language::Java);
    }

    #[test]
    fn test_language_from_str_rejects_unknown_language() {
        // テスト項目: 未知の言語名はパースに失敗する
        // given (前提条件):
        let value = "cobol";

        // when (操作):
        let result = Language::from_str(value);

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ValidationError::UnknownLanguage("cobol".to_string())
        );
    }

    #[test]
    fn test_language_serde_uses_lowercase_names() {
        // テスト項目: Language がワイヤ上では小文字の言語名になる
        // given (前提条件):
        let language = Language::Cpp;

        // when (操作):
        let json = serde_json::to_string(&language).unwrap();
        let parsed: Language = serde_json::from_str("\"python\"").unwrap();

        // then (期待する結果):
        assert_eq!(json, "\"cpp\"");
        assert_eq!(parsed, Language::Python);
    }

    #[test]
    fn test_timestamp_holds_millis() {
        // テスト項目: Timestamp がミリ秒値を保持する
        // given (前提条件):
        let millis = 1672531200000;

        // when (操作):
        let timestamp = Timestamp::new(millis);

        // then (期待する結果):
        assert_eq!(timestamp.value(), millis);
    }
}
