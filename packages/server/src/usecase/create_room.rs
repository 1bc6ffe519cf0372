//! UseCase: ルーム作成
//!
//! 検証済みの設定からルームを新規作成し、作成者を唯一のホストとして
//! 追加します。設定の検証（名前・定員の範囲）は `RoomConfig::new` が
//! 境界で行うため、ここに到達する設定は常に妥当です。

use std::sync::Arc;

use crate::domain::{LobbyError, PlayerName, Room, RoomConfig, RoomRepository};

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl CreateRoomUseCase {
    /// 新しい CreateRoomUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// ルーム作成を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Room)` - 作成されたルーム（作成者がホストとして含まれる）
    /// * `Err(LobbyError)` - 作成失敗（ID 採番の失敗など）
    pub async fn execute(
        &self,
        config: RoomConfig,
        host_name: PlayerName,
    ) -> Result<Room, LobbyError> {
        let room = self.repository.create_room(config, host_name).await?;
        tracing::info!("Room '{}' created by '{}'", room.id, room.players[0].name.as_str());
        Ok(room)
    }
}
