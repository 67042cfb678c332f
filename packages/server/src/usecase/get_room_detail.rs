//! UseCase: ルーム詳細の取得（HTTP API 用）
//!
//! パスパラメータはクライアント入力なので、値オブジェクトへの変換失敗も
//! 「ルームが見つからない」として扱う（不正な ID のルームは存在し得ない）。

use std::sync::Arc;

use crate::domain::{RoomId, RoomRegistry, RoomSnapshot};

use super::error::GetRoomDetailError;

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    /// Registry（ルーム状態管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
}

impl GetRoomDetailUseCase {
    /// 新しい GetRoomDetailUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// ルームの現在の状態を返す
    pub async fn execute(&self, room_id: String) -> Result<RoomSnapshot, GetRoomDetailError> {
        let room_id =
            RoomId::try_from(room_id).map_err(|_| GetRoomDetailError::RoomNotFound)?;
        self.registry
            .snapshot(&room_id)
            .await
            .map_err(|_| GetRoomDetailError::RoomNotFound)
    }
}
