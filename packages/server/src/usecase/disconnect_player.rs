//! UseCase: プレイヤー切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectPlayerUseCase::execute() メソッド
//! - ソケットクローズ（正常・異常）と sweeper が共有する切断経路
//!
//! ### なぜこのテストが必要か
//! - 切断は冪等でなければならない（クローズイベントと sweeper の競合、
//!   kick 済みプレイヤーのクローズなどで二重に呼ばれる）
//! - 再接続で置き換えられた古い接続のクローズが、新しい接続の購読と
//!   ロスター状態を壊してはならない
//! - ホストの切断では「最古の生存者」への再割り当てが同じイベントで
//!   通知される必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：接続クローズによる切断、ホスト切断と再割り当て
//! - エッジケース：置き換え済み接続のクローズ、二重切断

use std::sync::Arc;

use crate::domain::{
    ConnectionId, LobbyError, PlayerId, PresenceTracker, RemovalOutcome, RoomBroadcaster, RoomId,
    RoomRepository,
};

/// プレイヤー切断のユースケース
pub struct DisconnectPlayerUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Broadcaster（イベント配送の抽象化）
    broadcaster: Arc<dyn RoomBroadcaster>,
    /// PresenceTracker（接続の生存管理の抽象化）
    presence: Arc<dyn PresenceTracker>,
}

impl DisconnectPlayerUseCase {
    /// 新しい DisconnectPlayerUseCase を作成
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

    /// プレイヤー切断を実行（冪等）
    ///
    /// `connection_id` が与えられた場合、それが現在の接続であるときだけ
    /// 切断します（再接続で置き換えられた古い接続のクローズは no-op）。
    /// sweeper のように接続を特定できない呼び出し元は `None` を渡します。
    ///
    /// プレイヤーのレコードは削除されず `disconnected` のまま残り、
    /// 同名での復帰に備えます。
    ///
    /// # Returns
    ///
    /// * `Ok(Some(RemovalOutcome))` - 切断された（再割り当て先を含む）
    /// * `Ok(None)` - 何も起きなかった（置き換え済み、または既に切断済み）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        connection_id: Option<&ConnectionId>,
    ) -> Result<Option<RemovalOutcome>, LobbyError> {
        match connection_id {
            Some(connection_id) => {
                if !self
                    .broadcaster
                    .detach_if_current(player_id, connection_id)
                    .await
                {
                    // 新しい接続が既に購読を引き継いでいる
                    return Ok(None);
                }
            }
            None => {
                self.broadcaster.detach(player_id).await;
            }
        }

        // プレゼンスの解除失敗で切断を止めない
        if let Err(e) = self.presence.untrack(player_id).await {
            tracing::warn!("Failed to untrack presence for '{}': {}", player_id, e);
        }

        let outcome = self.repository.disconnect_player(room_id, player_id).await?;
        if outcome.is_some() {
            tracing::info!("Player '{}' disconnected from room '{}'", player_id, room_id);
        }
        Ok(outcome)
    }

    /// 切断イベントを残りのメンバーにブロードキャスト
    pub async fn broadcast_player_disconnected(&self, room_id: &RoomId, message: &str) {
        if let Err(e) = self.broadcaster.broadcast_room(room_id, message, None).await {
            tracing::warn!("Failed to broadcast player_disconnected: {}", e);
        }
    }
}
