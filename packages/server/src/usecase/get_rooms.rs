//! UseCase: ルーム一覧の取得（HTTP API 用）

use std::sync::Arc;

use crate::domain::{RoomRegistry, RoomSummary};

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    /// Registry（ルーム状態管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
}

impl GetRoomsUseCase {
    /// 新しい GetRoomsUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// 全ルームの要約を返す（ルーム ID 順）
    pub async fn execute(&self) -> Vec<RoomSummary> {
        self.registry.list_rooms().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, RoomId, UserId, Username};
    use crate::infrastructure::registry::InMemoryRoomRegistry;
    use kobo_shared::time::FixedClock;

    async fn join(registry: &Arc<InMemoryRoomRegistry>, room: &str, id: &str) {
        registry
            .join(
                RoomId::try_from(room.to_string()).unwrap(),
                UserId::try_from(id.to_string()).unwrap(),
                Username::try_from(id.to_string()).unwrap(),
                ConnectionId::generate(),
            )
            .await;
    }

    #[tokio::test]
    async fn test_lists_every_live_room() {
        // テスト項目: 生きている全ルームの要約が ID 順で返る
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new(Arc::new(FixedClock::new(
            1_700_000_000_000,
        ))));
        join(&registry, "beta", "bob").await;
        join(&registry, "alpha", "alice").await;
        join(&registry, "alpha", "anna").await;
        let usecase = GetRoomsUseCase::new(registry);

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].room_id.as_str(), "alpha");
        assert_eq!(rooms[0].participant_user_ids.len(), 2);
        assert_eq!(rooms[0].host_user_id.as_str(), "alice");
        assert_eq!(rooms[1].room_id.as_str(), "beta");
    }

    #[tokio::test]
    async fn test_empty_registry_lists_nothing() {
        // テスト項目: ルームが無ければ空のリストが返る
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new(Arc::new(FixedClock::new(
            1_700_000_000_000,
        ))));
        let usecase = GetRoomsUseCase::new(registry);

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        assert!(rooms.is_empty());
    }
}
