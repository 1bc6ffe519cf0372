//! UseCase: ルーム一覧取得
//!
//! 参加可能な（lobby フェーズの）ルームだけを作成順で返します。

use std::sync::Arc;

use crate::domain::{GamePhase, Room, RoomRepository};

/// ルーム一覧取得のユースケース
pub struct ListRoomsUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl ListRoomsUseCase {
    /// 新しい ListRoomsUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 参加可能なルームの一覧を取得
    pub async fn execute(&self) -> Vec<Room> {
        self.repository
            .list_rooms()
            .await
            .into_iter()
            .filter(|room| room.phase == GamePhase::Lobby)
            .collect()
    }
}
