//! UseCase: プレイヤー接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectPlayerUseCase::execute() メソッド
//! - WebSocket 接続の (ルーム, プレイヤー) への紐付け
//!
//! ### なぜこのテストが必要か
//! - 接続はメンバー確認・接続状態の更新・購読登録・プレゼンス追跡を
//!   またぐ操作であり、順序を誤ると「購読したのにロスター上は切断中」の
//!   ような不整合を作る
//! - 切断中レコードへの再接続（同一プレイヤー ID）で古い接続が
//!   新しい接続に置き換わることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加済みプレイヤーの接続、切断後の再接続
//! - 異常系：非メンバーの接続試行、プレゼンスストアの障害

use std::sync::Arc;

use crate::domain::{
    ConnectionId, LobbyError, PlayerId, PlayerStatus, PresenceTracker, PusherChannel, Room,
    RoomBroadcaster, RoomId, RoomRepository,
};

/// プレイヤー接続のユースケース
pub struct ConnectPlayerUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Broadcaster（イベント配送の抽象化）
    broadcaster: Arc<dyn RoomBroadcaster>,
    /// PresenceTracker（接続の生存管理の抽象化）
    presence: Arc<dyn PresenceTracker>,
}

impl ConnectPlayerUseCase {
    /// 新しい ConnectPlayerUseCase を作成
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

    /// プレイヤー接続を実行
    ///
    /// メンバー確認のうえ接続状態を active にし、接続をルームに購読させ、
    /// プレゼンス追跡を開始します。同一プレイヤーの既存の接続は
    /// 新しい接続で置き換えられます。
    ///
    /// # Returns
    ///
    /// * `Ok((Room, bool))` - authoritative なスナップショットと、
    ///   切断中レコードからの復帰だったかどうか
    /// * `Err(LobbyError)` - 接続失敗（非メンバー、ストア障害など）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<(Room, bool), LobbyError> {
        let before = self.repository.verify_member(room_id, player_id).await?;
        let resumed = before.status == PlayerStatus::Disconnected;

        let room = self
            .repository
            .attach_player(room_id, player_id, PlayerStatus::Active)
            .await?;

        self.broadcaster
            .attach(room_id.clone(), player_id.clone(), connection_id, sender)
            .await;

        self.presence
            .track(player_id.clone(), room_id.clone())
            .await
            .map_err(|e| {
                tracing::error!("Failed to track presence for '{}': {}", player_id, e);
                LobbyError::Internal(e.to_string())
            })?;

        tracing::info!("Player '{}' connected to room '{}'", player_id, room_id);
        Ok((room, resumed))
    }

    /// 復帰を他のメンバーにブロードキャスト
    ///
    /// 切断中だったプレイヤーが再接続した場合にのみ使います。
    pub async fn broadcast_reconnected(
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
            tracing::warn!("Failed to broadcast reconnection: {}", e);
        }
    }
}
