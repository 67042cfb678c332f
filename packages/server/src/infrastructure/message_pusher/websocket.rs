//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - WebSocket の `UnboundedSender` を接続 ID で管理
//! - 接続へのメッセージ送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//!
//! これにより、「WebSocket の生成」と「メッセージの送信」が分離されます：
//! - UI 層: WebSocket 接続の受付、sender の生成
//! - Infrastructure 層: sender の管理、メッセージ送信
//!
//! マップのキーはユーザ ID ではなく接続 ID です。同じユーザが再接続すると
//! 新しい接続 ID で新しいエントリが登録され、古い接続のエントリは
//! 切断処理の unregister で消えます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 接続中の WebSocket sender
    ///
    /// Key: ConnectionId
    /// Value: PusherChannel
    connections: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register(&self, connection_id: ConnectionId, channel: PusherChannel) {
        let mut connections = self.connections.lock().await;
        connections.insert(connection_id.clone(), channel);
        tracing::debug!(
            "Connection '{}' registered to MessagePusher",
            connection_id.as_str()
        );
    }

    async fn unregister(&self, connection_id: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id.as_str()
        );
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        message: &str,
    ) -> Result<(), MessagePushError> {
        let connections = self.connections.lock().await;

        if let Some(channel) = connections.get(connection_id) {
            channel
                .send(message.to_string())
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            tracing::debug!("Pushed message to connection '{}'", connection_id.as_str());
            Ok(())
        } else {
            Err(MessagePushError::ConnectionNotFound(
                connection_id.as_str().to_string(),
            ))
        }
    }

    async fn broadcast(
        &self,
        connection_ids: &[ConnectionId],
        message: &str,
    ) -> Result<(), MessagePushError> {
        let connections = self.connections.lock().await;

        for connection_id in connection_ids {
            if let Some(channel) = connections.get(connection_id) {
                // ブロードキャストでは一部の送信失敗を許容
                if let Err(e) = channel.send(message.to_string()) {
                    tracing::warn!(
                        "Failed to push message to connection '{}': {}",
                        connection_id.as_str(),
                        e
                    );
                } else {
                    tracing::debug!(
                        "Broadcasted message to connection '{}'",
                        connection_id.as_str()
                    );
                }
            } else {
                tracing::warn!(
                    "Connection '{}' not found during broadcast, skipping",
                    connection_id.as_str()
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - WebSocketMessagePusher の基本的なメッセージ送信機能
    // - push_to: 特定の接続への送信
    // - broadcast: 複数接続への送信
    // - エラーハンドリング（存在しない接続）
    //
    // 【なぜこのテストが必要か】
    // - MessagePusher は UseCase から呼ばれる通信層の中核
    // - メッセージの送信が正しく行われることを保証する必要がある
    // - 切断済みの接続が残っていても全体が止まらないことを検証する
    //
    // 【どのようなシナリオをテストするか】
    // 1. push_to の成功ケース
    // 2. push_to の失敗ケース（接続が存在しない）
    // 3. broadcast の成功ケース（複数接続）
    // 4. broadcast の部分失敗ケース（一部の接続が存在しない）
    // 5. unregister 後の送信が失敗すること
    // ========================================

    async fn register_connection(
        pusher: &WebSocketMessagePusher,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = ConnectionId::generate();
        pusher.register(connection_id.clone(), tx).await;
        (connection_id, rx)
    }

    #[tokio::test]
    async fn test_push_to_success() {
        // テスト項目: 特定の接続にメッセージを送信できる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (connection_id, mut rx) = register_connection(&pusher).await;

        // when (操作):
        let result = pusher.push_to(&connection_id, "Hello").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some("Hello".to_string()));
    }

    #[tokio::test]
    async fn test_push_to_connection_not_found() {
        // テスト項目: 存在しない接続への送信はエラーを返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let unknown = ConnectionId::generate();

        // when (操作):
        let result = pusher.push_to(&unknown, "Hello").await;

        // then (期待する結果):
        assert!(matches!(
            result.unwrap_err(),
            MessagePushError::ConnectionNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_broadcast_success() {
        // テスト項目: 複数の接続にメッセージをブロードキャストできる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (connection1, mut rx1) = register_connection(&pusher).await;
        let (connection2, mut rx2) = register_connection(&pusher).await;

        // when (操作):
        let targets = vec![connection1, connection2];
        let result = pusher.broadcast(&targets, "Broadcast message").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx1.recv().await, Some("Broadcast message".to_string()));
        assert_eq!(rx2.recv().await, Some("Broadcast message".to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_partial_failure() {
        // テスト項目: ブロードキャスト時、一部の接続が存在しなくても成功する
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (connection1, mut rx1) = register_connection(&pusher).await;
        let unknown = ConnectionId::generate();

        // when (操作):
        let targets = vec![connection1, unknown];
        let result = pusher.broadcast(&targets, "Broadcast message").await;

        // then (期待する結果): ブロードキャストは部分失敗を許容
        assert!(result.is_ok());
        assert_eq!(rx1.recv().await, Some("Broadcast message".to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_empty_targets() {
        // テスト項目: 空のターゲットリストでもエラーにならない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();

        // when (操作):
        let result = pusher.broadcast(&[], "Message").await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_push_to_after_unregister_fails() {
        // テスト項目: unregister 後の接続への送信はエラーを返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (connection_id, _rx) = register_connection(&pusher).await;
        pusher.unregister(&connection_id).await;

        // when (操作):
        let result = pusher.push_to(&connection_id, "Hello").await;

        // then (期待する結果):
        assert!(matches!(
            result.unwrap_err(),
            MessagePushError::ConnectionNotFound(_)
        ));
    }
}
