//! UseCase 層のエラー定義
//!
//! WebSocket 系のユースケースは Registry のエラーをそのまま返し、
//! ハンドラ側で警告ログとともに破棄します（送信元には何も返さない）。
//! HTTP 系のユースケースだけが独自のエラー型を持ち、
//! ハンドラでステータスコードに変換されます。

use thiserror::Error;

/// ルーム詳細取得のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GetRoomDetailError {
    /// 指定されたルームが存在しない（ID が不正な場合も含む）
    #[error("room not found")]
    RoomNotFound,
}
