//! UseCase: ping の更新
//!
//! クライアント申告の計測値なので、範囲外は拒否せずクランプします。
//! ping の受信は接続が生きている証拠でもあるため、プレゼンスの期限も
//! 同時にリフレッシュします。

use std::sync::Arc;

use crate::domain::{
    LobbyError, PingMs, PlayerId, PresenceTracker, RoomBroadcaster, RoomId, RoomRepository,
};

/// ping 更新のユースケース
pub struct UpdatePingUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Broadcaster（イベント配送の抽象化）
    broadcaster: Arc<dyn RoomBroadcaster>,
    /// PresenceTracker（接続の生存管理の抽象化）
    presence: Arc<dyn PresenceTracker>,
}

impl UpdatePingUseCase {
    /// 新しい UpdatePingUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        broadcaster: Arc<dyn RoomBroadcaster>,
        presence: Arc<dyn PresenceTracker>,
    ) -> Self {
        Self {
            repository,
            broadcaster,
            presence,
        }
    }

    /// ping 更新を実行
    ///
    /// # Returns
    ///
    /// * `Ok(PingMs)` - 書き込まれた（クランプ済みの）値
    /// * `Err(LobbyError)` - ルームまたはプレイヤーが不在
    pub async fn execute(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        ping_ms: i64,
    ) -> Result<PingMs, LobbyError> {
        let ping = PingMs::from_unclamped(ping_ms);
        self.repository.update_ping(room_id, player_id, ping).await?;

        if let Err(e) = self.presence.refresh(player_id).await {
            tracing::warn!("Failed to refresh presence for '{}': {}", player_id, e);
        }

        Ok(ping)
    }

    /// ping 更新を他のメンバーにブロードキャスト
    ///
    /// 本人は自分の計測値を知っているため除外します。
    pub async fn broadcast_ping_updated(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        message: &str,
    ) {
        if let Err(e) = self
            .broadcaster
            .broadcast_room(room_id, message, Some(player_id))
            .await
        {
            tracing::warn!("Failed to broadcast ping_updated: {}", e);
        }
    }
}
