//! UseCase: ルーム詳細取得
//!
//! 詳細（完全なロスター）はルームのメンバーだけが取得できます。

use std::sync::Arc;

use crate::domain::{LobbyError, PlayerId, Room, RoomId, RoomRepository};

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    /// 新しい GetRoomDetailUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// ルーム詳細を取得（メンバー確認付き）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<Room, LobbyError> {
        self.repository.verify_member(room_id, player_id).await?;
        self.repository.get_room(room_id).await
    }
}
