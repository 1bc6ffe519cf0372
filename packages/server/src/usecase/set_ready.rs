//! UseCase: ready フラグの変更
//!
//! 変更イベントは操作した本人を含む全員にブロードキャストします
//! （クライアント側は冪等に取り込めるため、自分の操作の反映も
//! 同じ経路で受け取る方が単純になります）。
//! 開始条件の成立は変更と同一クリティカルセクションで判定され、
//! 成立していれば advisory な `all_players_ready` を追加で流します。

use std::sync::Arc;

use crate::domain::{
    LobbyError, PlayerId, ReadyChange, RoomBroadcaster, RoomId, RoomRepository,
};

/// ready 変更のユースケース
pub struct SetReadyUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Broadcaster（イベント配送の抽象化）
    broadcaster: Arc<dyn RoomBroadcaster>,
}

impl SetReadyUseCase {
    /// 新しい SetReadyUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        broadcaster: Arc<dyn RoomBroadcaster>,
    ) -> Self {
        Self {
            repository,
            broadcaster,
        }
    }

    /// ready 変更を実行
    ///
    /// # Returns
    ///
    /// * `Ok(ReadyChange)` - 変更結果（開始条件の判定を含む）
    /// * `Err(LobbyError)` - 変更失敗（不在プレイヤー、開始済みルーム）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        is_ready: bool,
    ) -> Result<ReadyChange, LobbyError> {
        self.repository.set_ready(room_id, player_id, is_ready).await
    }

    /// 変更イベントをルーム全員（本人を含む）にブロードキャスト
    pub async fn broadcast_ready_changed(&self, room_id: &RoomId, message: &str) {
        if let Err(e) = self.broadcaster.broadcast_room(room_id, message, None).await {
            tracing::warn!("Failed to broadcast player_ready_changed: {}", e);
        }
    }

    /// 開始条件の成立をルーム全員に通知（状態変更なし）
    pub async fn broadcast_all_players_ready(&self, room_id: &RoomId, message: &str) {
        if let Err(e) = self.broadcaster.broadcast_room(room_id, message, None).await {
            tracing::warn!("Failed to broadcast all_players_ready: {}", e);
        }
    }
}
