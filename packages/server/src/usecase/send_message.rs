//! UseCase: チャットメッセージ送信
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() / deliver() メソッド
//! - 公開メッセージとプライベートメッセージの配送先選定
//!
//! ### なぜこのテストが必要か
//! - 「ルームを購読していないプレイヤーに届かない」という唯一の
//!   保存則をここで守る（メッセージは永続化されない）
//! - プライベートメッセージが送信者とターゲット以外に漏れないことを
//!   保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：公開メッセージの全員配送、プライベートの限定配送
//! - 異常系：空・上限超過の本文、非メンバーの送信、不在ターゲット

use std::sync::Arc;

use genkan_shared::time::get_utc_timestamp;

use crate::domain::{
    ChatMessage, LobbyError, MessageContent, PlayerId, RoomBroadcaster, RoomId, RoomRepository,
    Timestamp,
};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Broadcaster（イベント配送の抽象化）
    broadcaster: Arc<dyn RoomBroadcaster>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        broadcaster: Arc<dyn RoomBroadcaster>,
    ) -> Self {
        Self {
            repository,
            broadcaster,
        }
    }

    /// メッセージ送信を実行
    ///
    /// 本文の検証（空・上限超過は `InvalidMessage`）と、送信者・
    /// ターゲットのメンバー確認を行い、配送可能なメッセージを組み立てます。
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 配送可能なメッセージ（`deliver` に渡す）
    /// * `Err(LobbyError)` - 検証失敗（何も配送されない）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        sender_id: &PlayerId,
        content: String,
        target_player_id: Option<PlayerId>,
    ) -> Result<ChatMessage, LobbyError> {
        let content = MessageContent::new(content)?;
        let sender = self.repository.verify_member(room_id, sender_id).await?;
        if let Some(target) = &target_player_id {
            self.repository.verify_member(room_id, target).await?;
        }

        Ok(ChatMessage::new(
            room_id.clone(),
            sender.id,
            sender.name,
            content,
            target_player_id,
            Timestamp::new(get_utc_timestamp()),
        ))
    }

    /// メッセージを配送する
    ///
    /// プライベートメッセージは送信者とターゲットの接続にのみ、
    /// 公開メッセージはルーム全員（送信者を含む）に届けます。
    pub async fn deliver(&self, message: &ChatMessage, payload: &str) {
        match &message.target_player_id {
            Some(target) => {
                let mut recipients = vec![&message.sender_id];
                if target != &message.sender_id {
                    recipients.push(target);
                }
                for recipient in recipients {
                    if let Err(e) = self.broadcaster.push_to(recipient, payload).await {
                        tracing::warn!(
                            "Failed to deliver private message to '{}': {}",
                            recipient,
                            e
                        );
                    }
                }
            }
            None => {
                if let Err(e) = self
                    .broadcaster
                    .broadcast_room(&message.room_id, payload, None)
                    .await
                {
                    tracing::warn!("Failed to deliver message: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, Language, MAX_MESSAGE_LEN, PlayerName, Room, RoomConfig};
    use crate::infrastructure::broadcaster::WebSocketBroadcaster;
    use crate::infrastructure::repository::InMemoryRoomRepository;
    use tokio::sync::mpsc;

    struct Fixture {
        repository: Arc<InMemoryRoomRepository>,
        broadcaster: Arc<WebSocketBroadcaster>,
        usecase: SendMessageUseCase,
    }

    fn fixture() -> Fixture {
        let repository = Arc::new(InMemoryRoomRepository::new());
        let broadcaster = Arc::new(WebSocketBroadcaster::new());
        let usecase = SendMessageUseCase::new(repository.clone(), broadcaster.clone());
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
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        fx.broadcaster
            .attach(room_id.clone(), player_id.clone(), ConnectionId::generate(), tx)
            .await;
        rx
    }

    #[tokio::test]
    async fn test_public_message_reaches_whole_room() {
        // テスト項目: 公開メッセージが送信者を含む全員に届く
        // given (前提条件):
        let fx = fixture();
        let (room, ids) = seeded_room(&fx, &["alice", "bob"]).await;
        let mut rx_host = attach(&fx, &room.id, &ids[0]).await;
        let mut rx_alice = attach(&fx, &room.id, &ids[1]).await;
        let mut rx_bob = attach(&fx, &room.id, &ids[2]).await;

        // when (操作):
        let message = fx
            .usecase
            .execute(&room.id, &ids[0], "hello".to_string(), None)
            .await
            .unwrap();
        fx.usecase.deliver(&message, "new_message").await;

        // then (期待する結果):
        assert_eq!(rx_host.recv().await, Some("new_message".to_string()));
        assert_eq!(rx_alice.recv().await, Some("new_message".to_string()));
        assert_eq!(rx_bob.recv().await, Some("new_message".to_string()));
        assert!(!message.is_private());
    }

    #[tokio::test]
    async fn test_private_message_reaches_only_sender_and_target() {
        // テスト項目: プライベートメッセージが第三者に漏れない
        // given (前提条件):
        let fx = fixture();
        let (room, ids) = seeded_room(&fx, &["alice", "bob"]).await;
        let mut rx_host = attach(&fx, &room.id, &ids[0]).await;
        let mut rx_alice = attach(&fx, &room.id, &ids[1]).await;
        let mut rx_bob = attach(&fx, &room.id, &ids[2]).await;

        // when (操作): host から alice へのプライベートメッセージ
        let message = fx
            .usecase
            .execute(
                &room.id,
                &ids[0],
                "psst".to_string(),
                Some(ids[1].clone()),
            )
            .await
            .unwrap();
        fx.usecase.deliver(&message, "new_message").await;

        // then (期待する結果):
        assert!(message.is_private());
        assert_eq!(rx_host.recv().await, Some("new_message".to_string()));
        assert_eq!(rx_alice.recv().await, Some("new_message".to_string()));
        assert!(rx_bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_body_is_rejected() {
        // テスト項目: 空・上限超過の本文が InvalidMessage になる
        // given (前提条件):
        let fx = fixture();
        let (room, ids) = seeded_room(&fx, &[]).await;

        // when (操作) / then (期待する結果):
        assert_eq!(
            fx.usecase
                .execute(&room.id, &ids[0], "   ".to_string(), None)
                .await
                .unwrap_err(),
            LobbyError::InvalidMessage
        );
        assert_eq!(
            fx.usecase
                .execute(&room.id, &ids[0], "x".repeat(MAX_MESSAGE_LEN + 1), None)
                .await
                .unwrap_err(),
            LobbyError::InvalidMessage
        );
    }

    #[tokio::test]
    async fn test_sender_and_target_must_be_members() {
        // テスト項目: 非メンバーの送信と不在ターゲットが NotFound になる
        // given (前提条件):
        let fx = fixture();
        let (room, ids) = seeded_room(&fx, &[]).await;
        let ghost = PlayerId::generate();

        // when (操作) / then (期待する結果):
        assert_eq!(
            fx.usecase
                .execute(&room.id, &ghost, "hello".to_string(), None)
                .await
                .unwrap_err(),
            LobbyError::NotFound
        );
        assert_eq!(
            fx.usecase
                .execute(&room.id, &ids[0], "hello".to_string(), Some(ghost))
                .await
                .unwrap_err(),
            LobbyError::NotFound
        );
    }
}
