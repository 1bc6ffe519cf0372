//! UseCase: 自発的な退室
//!
//! ソケットの喪失（soft disconnect、レコードは残る）と違い、
//! 退室はレコードを完全に削除します。同名での再参加は新規扱いです。

use std::sync::Arc;

use crate::domain::{
    LobbyError, PlayerId, PresenceTracker, RemovalOutcome, RoomBroadcaster, RoomId, RoomRepository,
};

/// 退室のユースケース
pub struct LeaveRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Broadcaster（イベント配送の抽象化）
    broadcaster: Arc<dyn RoomBroadcaster>,
    /// PresenceTracker（接続の生存管理の抽象化）
    presence: Arc<dyn PresenceTracker>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
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

    /// 退室を実行（冪等）
    ///
    /// # Returns
    ///
    /// * `Ok(Some(RemovalOutcome))` - 退室した（再割り当て先を含む）
    /// * `Ok(None)` - 既にロスターにいない
    pub async fn execute(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<Option<RemovalOutcome>, LobbyError> {
        self.broadcaster.detach(player_id).await;
        if let Err(e) = self.presence.untrack(player_id).await {
            tracing::warn!("Failed to untrack presence for '{}': {}", player_id, e);
        }

        let outcome = self.repository.leave_room(room_id, player_id).await?;
        if outcome.is_some() {
            tracing::info!("Player '{}' left room '{}'", player_id, room_id);
        }
        Ok(outcome)
    }

    /// 退室イベントを残りのメンバーにブロードキャスト
    pub async fn broadcast_player_left(&self, room_id: &RoomId, message: &str) {
        if let Err(e) = self.broadcaster.broadcast_room(room_id, message, None).await {
            tracing::warn!("Failed to broadcast player_disconnected: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JoinOutcome, Language, PlayerName, RoomConfig};
    use crate::infrastructure::broadcaster::WebSocketBroadcaster;
    use crate::infrastructure::presence::{InMemoryPresenceStore, TtlPresenceTracker};
    use crate::infrastructure::repository::InMemoryRoomRepository;
    use std::time::Duration;

    fn name(value: &str) -> PlayerName {
        PlayerName::new(value.to_string()).unwrap()
    }

    fn usecase() -> (Arc<InMemoryRoomRepository>, LeaveRoomUseCase) {
        let repository = Arc::new(InMemoryRoomRepository::new());
        let broadcaster = Arc::new(WebSocketBroadcaster::new());
        let presence = Arc::new(TtlPresenceTracker::new(
            Duration::from_secs(30),
            Arc::new(InMemoryPresenceStore::new()),
        ));
        let usecase = LeaveRoomUseCase::new(repository.clone(), broadcaster, presence);
        (repository, usecase)
    }

    #[tokio::test]
    async fn test_leave_removes_record_so_name_is_reusable() {
        // テスト項目: 退室したプレイヤーの名前が新規参加に使える（復帰ではない）
        // given (前提条件):
        let (repository, usecase) = usecase();
        let config = RoomConfig::new("test room".to_string(), None, Language::En, 4).unwrap();
        let room = repository.create_room(config, name("host")).await.unwrap();
        let (outcome, _) = repository
            .join_room(&room.id, name("alice"), None)
            .await
            .unwrap();
        let alice_id = outcome.player().id.clone();

        // when (操作):
        let left = usecase.execute(&room.id, &alice_id).await.unwrap();
        let (rejoin, _) = repository
            .join_room(&room.id, name("alice"), None)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(left.is_some());
        assert!(matches!(rejoin, JoinOutcome::Joined(_)));
        assert_ne!(rejoin.player().id, alice_id);
    }

    #[tokio::test]
    async fn test_leave_is_idempotent() {
        // テスト項目: 退室が冪等である
        // given (前提条件):
        let (repository, usecase) = usecase();
        let config = RoomConfig::new("test room".to_string(), None, Language::En, 4).unwrap();
        let room = repository.create_room(config, name("host")).await.unwrap();
        let (outcome, _) = repository
            .join_room(&room.id, name("alice"), None)
            .await
            .unwrap();
        let alice_id = outcome.player().id.clone();

        // when (操作):
        let first = usecase.execute(&room.id, &alice_id).await.unwrap();
        let second = usecase.execute(&room.id, &alice_id).await.unwrap();

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_host_leave_reassigns_host() {
        // テスト項目: ホストの退室で最古の生存者にホストが移る
        // given (前提条件):
        let (repository, usecase) = usecase();
        let config = RoomConfig::new("test room".to_string(), None, Language::En, 4).unwrap();
        let room = repository.create_room(config, name("host")).await.unwrap();
        let host_id = room.players[0].id.clone();
        let (outcome, _) = repository
            .join_room(&room.id, name("alice"), None)
            .await
            .unwrap();
        let alice_id = outcome.player().id.clone();

        // when (操作):
        let left = usecase.execute(&room.id, &host_id).await.unwrap().unwrap();

        // then (期待する結果):
        assert_eq!(left.new_host_id, Some(alice_id.clone()));
        let snapshot = repository.get_room(&room.id).await.unwrap();
        assert_eq!(snapshot.host().unwrap().id, alice_id);
    }
}
