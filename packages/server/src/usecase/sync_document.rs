//! UseCase: 共有ドキュメントの同期（コード・言語）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SyncDocumentUseCase::update_code() / update_language() メソッド
//!
//! ### なぜこのテストが必要か
//! - コード更新が編集者以外の全メンバーに code-update として届くことを保証
//! - 言語切替が host-only であり、language-update として届くことを保証
//! - 最終書き込みが勝つ（LWW）ことをスナップショットで保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：メンバーによるコード更新、ホストによる言語切替
//! - 異常系：非メンバーの更新、非ホストの言語切替

use std::sync::Arc;

use crate::domain::{
    Language, MessagePusher, Participant, RegistryError, RoomId, RoomRegistry, UserId,
};
use crate::infrastructure::dto::websocket::ServerEvent;

/// 共有ドキュメント同期のユースケース
pub struct SyncDocumentUseCase {
    /// Registry（ルーム状態管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl SyncDocumentUseCase {
    /// 新しい SyncDocumentUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// ドキュメント全体を置き換え、編集者以外のメンバーへ中継する
    pub async fn update_code(
        &self,
        room_id: &RoomId,
        editor: &UserId,
        code: String,
    ) -> Result<(), RegistryError> {
        // 1. 通知イベントを先に組み立てる（code の所有権は Registry へ渡す）
        let event = ServerEvent::CodeUpdate { code: code.clone() };

        // 2. Registry を更新する（LWW: 受信順で上書き）
        let outcome = self.registry.update_code(room_id, editor, code).await?;

        // 3. 編集者以外の全メンバーへ中継する
        self.relay(&outcome.others, &event).await;
        Ok(())
    }

    /// ルームの実行言語を切り替え、操作者以外のメンバーへ中継する（ホスト専用）
    pub async fn update_language(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        language: Language,
    ) -> Result<(), RegistryError> {
        // 1. Registry を更新する（ホスト検証は Registry 側で行う）
        let outcome = self
            .registry
            .update_language(room_id, actor, language)
            .await?;

        // 2. 操作者以外の全メンバーへ中継する
        let event = ServerEvent::LanguageUpdate { language };
        self.relay(&outcome.others, &event).await;
        Ok(())
    }

    async fn relay(&self, targets: &[Participant], event: &ServerEvent) {
        if targets.is_empty() {
            return;
        }
        let connection_ids: Vec<_> = targets.iter().map(|p| p.connection_id.clone()).collect();
        let json = serde_json::to_string(event).unwrap();
        if let Err(e) = self.message_pusher.broadcast(&connection_ids, &json).await {
            tracing::warn!("Failed to broadcast document update: {}", e);
        }
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
        SyncDocumentUseCase,
        Arc<InMemoryRoomRegistry>,
        Arc<WebSocketMessagePusher>,
    ) {
        let registry = Arc::new(InMemoryRoomRegistry::new(Arc::new(FixedClock::new(
            1_700_000_000_000,
        ))));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = SyncDocumentUseCase::new(registry.clone(), pusher.clone());
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
    async fn test_code_update_reaches_everyone_but_the_editor() {
        // テスト項目: コード更新が編集者以外の全メンバーに届く
        // given (前提条件):
        let (usecase, registry, pusher) = create_usecase();
        let mut alice_rx = join(&registry, &pusher, "room-1", "alice").await;
        let mut bob_rx = join(&registry, &pusher, "room-1", "bob").await;

        // when (操作):
        usecase
            .update_code(&room_id("room-1"), &user("bob"), "let x = 1;".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        match next_event(&mut alice_rx) {
            ServerEvent::CodeUpdate { code } => assert_eq!(code, "let x = 1;"),
            other => panic!("expected code-update, got {:?}", other),
        }
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_last_code_write_wins() {
        // テスト項目: 後から届いた更新がスナップショットに反映される
        // given (前提条件):
        let (usecase, registry, pusher) = create_usecase();
        let _alice_rx = join(&registry, &pusher, "room-1", "alice").await;
        let _bob_rx = join(&registry, &pusher, "room-1", "bob").await;

        // when (操作):
        usecase
            .update_code(&room_id("room-1"), &user("alice"), "first".to_string())
            .await
            .unwrap();
        usecase
            .update_code(&room_id("room-1"), &user("bob"), "second".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        let snapshot = registry.snapshot(&room_id("room-1")).await.unwrap();
        assert_eq!(snapshot.code, "second");
    }

    #[tokio::test]
    async fn test_code_update_from_non_member_is_rejected() {
        // テスト項目: 非メンバーのコード更新は NotMember で拒否される
        // given (前提条件):
        let (usecase, registry, pusher) = create_usecase();
        let mut alice_rx = join(&registry, &pusher, "room-1", "alice").await;

        // when (操作):
        let result = usecase
            .update_code(&room_id("room-1"), &user("mallory"), "pwned".to_string())
            .await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            RegistryError::Room(RoomError::NotMember("mallory".to_string()))
        );
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_language_update_is_host_only() {
        // テスト項目: 言語切替はホストのみが行え、他メンバーに届く
        // given (前提条件):
        let (usecase, registry, pusher) = create_usecase();
        let mut alice_rx = join(&registry, &pusher, "room-1", "alice").await;
        let mut bob_rx = join(&registry, &pusher, "room-1", "bob").await;

        // when (操作): 非ホストの bob が試みる
        let denied = usecase
            .update_language(&room_id("room-1"), &user("bob"), Language::Python)
            .await;

        // then (期待する結果):
        assert_eq!(
            denied.unwrap_err(),
            RegistryError::Room(RoomError::NotHost("bob".to_string()))
        );

        // when (操作): ホストの alice が切り替える
        usecase
            .update_language(&room_id("room-1"), &user("alice"), Language::Python)
            .await
            .unwrap();

        // then (期待する結果):
        match next_event(&mut bob_rx) {
            ServerEvent::LanguageUpdate { language } => assert_eq!(language, Language::Python),
            other => panic!("expected language-update, got {:?}", other),
        }
        assert!(alice_rx.try_recv().is_err());
        let snapshot = registry.snapshot(&room_id("room-1")).await.unwrap();
        assert_eq!(snapshot.language, Language::Python);
    }
}
