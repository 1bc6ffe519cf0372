//! UseCase: プレイヤーのキック
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - KickPlayerUseCase の execute / notify_kicked / detach_target /
//!   broadcast_player_kicked の一連の流れ
//!
//! ### なぜこのテストが必要か
//! - キックは「本人への個別通知」と「残りのメンバーへの通知」が
//!   別イベントであり、順序（通知してから購読解除）を誤ると本人に
//!   通知が届かない
//! - キックは完全削除であり、復帰（resume-by-name）の対象外である
//!   ことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：ホストによるキックと両系統の通知
//! - 異常系：非ホストの試行、自己キック、不在ターゲット

use std::sync::Arc;

use crate::domain::{
    LobbyError, MessagePushError, PlayerId, PresenceTracker, RemovalOutcome, RoomBroadcaster,
    RoomId, RoomRepository,
};

/// キックのユースケース
pub struct KickPlayerUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Broadcaster（イベント配送の抽象化）
    broadcaster: Arc<dyn RoomBroadcaster>,
    /// PresenceTracker（接続の生存管理の抽象化）
    presence: Arc<dyn PresenceTracker>,
}

impl KickPlayerUseCase {
    /// 新しい KickPlayerUseCase を作成
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

    /// キックを実行
    ///
    /// ホスト権限・自己キック・ターゲットの存在はルームのロックの
    /// 内側で検証されます。レコードは完全に削除されます。
    pub async fn execute(
        &self,
        room_id: &RoomId,
        acting: &PlayerId,
        target: &PlayerId,
    ) -> Result<RemovalOutcome, LobbyError> {
        let outcome = self.repository.kick_player(room_id, acting, target).await?;
        tracing::info!(
            "Player '{}' kicked from room '{}' by host",
            target,
            room_id
        );
        Ok(outcome)
    }

    /// キックされた本人に個別通知を送る
    ///
    /// 購読を解除する前に呼ぶこと。接続していないターゲット
    /// （通知先なし）は失敗扱いにしません。
    pub async fn notify_kicked(&self, target: &PlayerId, message: &str) {
        match self.broadcaster.push_to(target, message).await {
            Ok(()) | Err(MessagePushError::ClientNotFound(_)) => {}
            Err(e) => tracing::warn!("Failed to notify kicked player '{}': {}", target, e),
        }
    }

    /// キックされたターゲットの接続と追跡を解除する
    pub async fn detach_target(&self, target: &PlayerId) {
        self.broadcaster.detach(target).await;
        if let Err(e) = self.presence.untrack(target).await {
            tracing::warn!("Failed to untrack presence for '{}': {}", target, e);
        }
    }

    /// キックイベントを残りのメンバーにブロードキャスト
    pub async fn broadcast_player_kicked(&self, room_id: &RoomId, message: &str) {
        if let Err(e) = self.broadcaster.broadcast_room(room_id, message, None).await {
            tracing::warn!("Failed to broadcast player_kicked: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, JoinOutcome, Language, PlayerName, Room, RoomConfig};
    use crate::infrastructure::broadcaster::WebSocketBroadcaster;
    use crate::infrastructure::presence::{InMemoryPresenceStore, TtlPresenceTracker};
    use crate::infrastructure::repository::InMemoryRoomRepository;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Fixture {
        repository: Arc<InMemoryRoomRepository>,
        broadcaster: Arc<WebSocketBroadcaster>,
        usecase: KickPlayerUseCase,
    }

    fn fixture() -> Fixture {
        let repository = Arc::new(InMemoryRoomRepository::new());
        let broadcaster = Arc::new(WebSocketBroadcaster::new());
        let presence = Arc::new(TtlPresenceTracker::new(
            Duration::from_secs(30),
            Arc::new(InMemoryPresenceStore::new()),
        ));
        let usecase =
            KickPlayerUseCase::new(repository.clone(), broadcaster.clone(), presence);
        Fixture {
            repository,
            broadcaster,
            usecase,
        }
    }

    fn name(value: &str) -> PlayerName {
        PlayerName::new(value.to_string()).unwrap()
    }

    async fn seeded_room(fx: &Fixture, players: &[&str]) -> (Room, Vec<PlayerId>) {
        let config = RoomConfig::new("test room".to_string(), None, Language::En, 6).unwrap();
        let room = fx.repository.create_room(config, name("host")).await.unwrap();
        let mut ids = vec![room.players[0].id.clone()];
        for player in players {
            let (outcome, _) = fx
                .repository
                .join_room(&room.id, name(player), None)
                .await
                .unwrap();
            ids.push(outcome.player().id.clone());
        }
        (room, ids)
    }

    async fn attach(
        fx: &Fixture,
        room_id: &crate::domain::RoomId,
        player_id: &PlayerId,
    ) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        fx.broadcaster
            .attach(room_id.clone(), player_id.clone(), ConnectionId::generate(), tx)
            .await;
        rx
    }

    #[tokio::test]
    async fn test_kick_notifies_target_then_room() {
        // テスト項目: 本人に個別通知が届き、残りのメンバーに別イベントが届く
        // given (前提条件): host / alice / bob の 3 人が接続済み
        let fx = fixture();
        let (room, ids) = seeded_room(&fx, &["alice", "bob"]).await;
        let mut rx_host = attach(&fx, &room.id, &ids[0]).await;
        let mut rx_alice = attach(&fx, &room.id, &ids[1]).await;
        let mut rx_bob = attach(&fx, &room.id, &ids[2]).await;

        // when (操作): host が alice をキック
        fx.usecase.execute(&room.id, &ids[0], &ids[1]).await.unwrap();
        fx.usecase.notify_kicked(&ids[1], "kicked").await;
        fx.usecase.detach_target(&ids[1]).await;
        fx.usecase
            .broadcast_player_kicked(&room.id, "player_kicked")
            .await;

        // then (期待する結果):
        assert_eq!(rx_alice.recv().await, Some("kicked".to_string()));
        assert!(rx_alice.try_recv().is_err());
        assert_eq!(rx_host.recv().await, Some("player_kicked".to_string()));
        assert_eq!(rx_bob.recv().await, Some("player_kicked".to_string()));
    }

    #[tokio::test]
    async fn test_kick_permission_matrix() {
        // テスト項目: 非ホスト・自己キック・不在ターゲットの拒否
        // given (前提条件):
        let fx = fixture();
        let (room, ids) = seeded_room(&fx, &["alice"]).await;
        let ghost = PlayerId::generate();

        // when (操作) / then (期待する結果):
        assert_eq!(
            fx.usecase
                .execute(&room.id, &ids[1], &ids[0])
                .await
                .unwrap_err(),
            LobbyError::Forbidden
        );
        assert_eq!(
            fx.usecase
                .execute(&room.id, &ids[0], &ids[0])
                .await
                .unwrap_err(),
            LobbyError::CannotKickSelf
        );
        assert_eq!(
            fx.usecase
                .execute(&room.id, &ids[0], &ghost)
                .await
                .unwrap_err(),
            LobbyError::NotFound
        );
    }

    #[tokio::test]
    async fn test_kicked_player_rejoins_as_fresh_player() {
        // テスト項目: キックされたプレイヤーの同名再参加が新規扱いになる
        // given (前提条件):
        let fx = fixture();
        let (room, ids) = seeded_room(&fx, &["alice"]).await;

        // when (操作):
        fx.usecase.execute(&room.id, &ids[0], &ids[1]).await.unwrap();
        let (rejoin, _) = fx
            .repository
            .join_room(&room.id, name("alice"), None)
            .await
            .unwrap();

        // then (期待する結果): 復帰ではなく新しい ID での参加
        assert!(matches!(rejoin, JoinOutcome::Joined(_)));
        assert_ne!(rejoin.player().id, ids[1]);
    }

    #[tokio::test]
    async fn test_notify_kicked_without_connection_is_tolerated() {
        // テスト項目: 接続していないターゲットへの個別通知が失敗扱いにならない
        // given (前提条件):
        let fx = fixture();
        let (room, ids) = seeded_room(&fx, &["alice"]).await;

        // when (操作): alice は未接続のままキック
        fx.usecase.execute(&room.id, &ids[0], &ids[1]).await.unwrap();
        fx.usecase.notify_kicked(&ids[1], "kicked").await;

        // then (期待する結果): パニックせず完了する（ログのみ）
    }
}
