//! メッセージ送信のインターフェース定義
//!
//! 依存性逆転の原則（DIP）に基づき、Domain 層でインターフェースを定義し、
//! Infrastructure 層で実装します。Usecase 層は「どの接続に何を送るか」だけを
//! 指示し、WebSocket の送信経路を知りません。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::MessagePushError;
use super::value_object::ConnectionId;

/// 接続ごとの送信チャネル。
/// 受信側は WebSocket ハンドラ内の送信タスクが保持する。
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// 接続へのメッセージ送信
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャネルを登録する
    async fn register(&self, connection_id: ConnectionId, channel: PusherChannel);

    /// 接続の送信チャネルを破棄する
    async fn unregister(&self, connection_id: &ConnectionId);

    /// 単一の接続へメッセージを送信する
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        message: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続へ同じメッセージを送信する。
    /// 一部の接続への送信失敗はログに記録して続行する（部分失敗を許容）。
    async fn broadcast(
        &self,
        connection_ids: &[ConnectionId],
        message: &str,
    ) -> Result<(), MessagePushError>;
}
