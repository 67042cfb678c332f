//! UseCase: カーソル位置の中継
//!
//! カーソル位置と選択範囲はルーム状態として保持せず、送信者以外の
//! メンバーへそのまま中継するだけの純粋なプレゼンス情報として扱う。

use std::sync::Arc;

use crate::domain::{MessagePusher, RegistryError, RoomId, RoomRegistry, UserId};
use crate::infrastructure::dto::websocket::{CursorPosition, CursorSelection, ServerEvent};

/// カーソル中継のユースケース
pub struct CursorRelayUseCase {
    /// Registry（ルーム状態管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl CursorRelayUseCase {
    /// 新しい CursorRelayUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// カーソル位置を送信者以外の全メンバーへ中継する（メンバー専用）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        position: Option<CursorPosition>,
        selection: Option<CursorSelection>,
    ) -> Result<(), RegistryError> {
        // 1. 中継先（送信者以外の全メンバー）を解決する
        let peers = self.registry.peers(room_id, user_id).await?;
        if peers.is_empty() {
            return Ok(());
        }

        // 2. そのまま中継する
        let event = ServerEvent::CursorUpdate {
            user_id: user_id.as_str().to_string(),
            position,
            selection,
        };
        let targets: Vec<_> = peers.iter().map(|p| p.connection_id.clone()).collect();
        let json = serde_json::to_string(&event).unwrap();
        if let Err(e) = self.message_pusher.broadcast(&targets, &json).await {
            tracing::warn!("Failed to broadcast cursor-update: {}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, RoomError, Username};
    use crate::infrastructure::message_pusher::WebSocketMessagePusher;
    use crate::infrastructure::registry::InMemoryRoomRegistry;
    use kobo_shared::time::FixedClock;
    use tokio::sync::mpsc;

    fn create_usecase() -> (
        CursorRelayUseCase,
        Arc<InMemoryRoomRegistry>,
        Arc<WebSocketMessagePusher>,
    ) {
        let registry = Arc::new(InMemoryRoomRegistry::new(Arc::new(FixedClock::new(
            1_700_000_000_000,
        ))));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = CursorRelayUseCase::new(registry.clone(), pusher.clone());
        (usecase, registry, pusher)
    }

    async fn join(
        registry: &Arc<InMemoryRoomRegistry>,
        pusher: &Arc<WebSocketMessagePusher>,
        room: &str,
        id: &str,
    ) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = ConnectionId::generate();
        pusher.register(connection_id.clone(), tx).await;
        registry
            .join(
                room_id(room),
                user(id),
                Username::try_from(id.to_string()).unwrap(),
                connection_id,
            )
            .await;
        rx
    }

    fn next_event(rx: &mut mpsc::UnboundedReceiver<String>) -> ServerEvent {
        let raw = rx.try_recv().expect("expected a pushed event");
        serde_json::from_str(&raw).unwrap()
    }

    fn room_id(id: &str) -> RoomId {
        RoomId::try_from(id.to_string()).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::try_from(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_cursor_reaches_peers_but_not_the_sender() {
        // テスト項目: カーソル位置が送信者以外の全メンバーに届く
        // given (前提条件):
        let (usecase, registry, pusher) = create_usecase();
        let mut alice_rx = join(&registry, &pusher, "room-1", "alice").await;
        let mut bob_rx = join(&registry, &pusher, "room-1", "bob").await;

        // when (操作):
        usecase
            .execute(
                &room_id("room-1"),
                &user("bob"),
                Some(CursorPosition {
                    line_number: 5,
                    column: 10,
                }),
                None,
            )
            .await
            .unwrap();

        // then (期待する結果):
        match next_event(&mut alice_rx) {
            ServerEvent::CursorUpdate {
                user_id,
                position,
                selection,
            } => {
                assert_eq!(user_id, "bob");
                assert_eq!(
                    position,
                    Some(CursorPosition {
                        line_number: 5,
                        column: 10,
                    })
                );
                assert_eq!(selection, None);
            }
            other => panic!("expected cursor-update, got {:?}", other),
        }
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_selection_passes_through_unchanged() {
        // テスト項目: 選択範囲が欠損なく中継される
        // given (前提条件):
        let (usecase, registry, pusher) = create_usecase();
        let mut alice_rx = join(&registry, &pusher, "room-1", "alice").await;
        let _bob_rx = join(&registry, &pusher, "room-1", "bob").await;
        let selection = CursorSelection {
            start_line_number: 1,
            start_column: 1,
            end_line_number: 3,
            end_column: 20,
        };

        // when (操作):
        usecase
            .execute(&room_id("room-1"), &user("bob"), None, Some(selection.clone()))
            .await
            .unwrap();

        // then (期待する結果):
        match next_event(&mut alice_rx) {
            ServerEvent::CursorUpdate { selection: got, .. } => {
                assert_eq!(got, Some(selection));
            }
            other => panic!("expected cursor-update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lone_member_cursor_is_dropped() {
        // テスト項目: 中継先がいない場合は何も送らない
        // given (前提条件):
        let (usecase, registry, pusher) = create_usecase();
        let mut alice_rx = join(&registry, &pusher, "room-1", "alice").await;

        // when (操作):
        usecase
            .execute(&room_id("room-1"), &user("alice"), None, None)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_non_member_cursor_is_rejected() {
        // テスト項目: 非メンバーのカーソル送信は拒否される
        // given (前提条件):
        let (usecase, registry, pusher) = create_usecase();
        let _alice_rx = join(&registry, &pusher, "room-1", "alice").await;

        // when (操作):
        let result = usecase
            .execute(&room_id("room-1"), &user("mallory"), None, None)
            .await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            RegistryError::Room(RoomError::NotMember("mallory".to_string()))
        );
    }
}
