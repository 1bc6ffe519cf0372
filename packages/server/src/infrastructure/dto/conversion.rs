//! Conversion logic between DTOs and domain entities.

use genkan_shared::time::timestamp_to_utc_rfc3339;

use crate::domain::{ChatMessage, Player, Room};
use crate::infrastructure::dto::http::RoomSummaryDto;
use crate::infrastructure::dto::websocket::{PlayerDto, RoomStateDto, ServerEvent};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Player> for PlayerDto {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.as_str().to_string(),
            name: player.name.as_str().to_string(),
            is_host: player.is_host,
            is_ready: player.is_ready,
            status: player.status.as_str().to_string(),
            ping_ms: player.ping.map(|p| p.value()),
            country: player.country.clone(),
            country_flag: player.country_flag.clone(),
            attack_troops: player.attack_troops,
            defense_troops: player.defense_troops,
            joined_at: player.joined_at.value(),
        }
    }
}

impl From<&Room> for RoomStateDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            name: room.name.clone(),
            language: room.language.as_str().to_string(),
            max_players: room.max_players,
            phase: room.phase.as_str().to_string(),
            has_password: room.has_password(),
            created_at: room.created_at.value(),
            players: room.players.iter().map(PlayerDto::from).collect(),
        }
    }
}

impl From<&Room> for RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            name: room.name.clone(),
            host_name: room.host().map(|h| h.name.as_str().to_string()),
            has_password: room.has_password(),
            language: room.language.as_str().to_string(),
            max_players: room.max_players,
            player_count: room.active_count(),
            created_at: timestamp_to_utc_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&ChatMessage> for ServerEvent {
    fn from(message: &ChatMessage) -> Self {
        Self::NewMessage {
            id: message.id.clone(),
            sender_id: message.sender_id.as_str().to_string(),
            sender_name: message.sender_name.as_str().to_string(),
            content: message.content.as_str().to_string(),
            target_player_id: message
                .target_player_id
                .as_ref()
                .map(|id| id.as_str().to_string()),
            created_at: message.created_at.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Language, MessageContent, PlayerId, PlayerName, RoomConfig, RoomId, Timestamp,
    };

    fn test_room() -> Room {
        Room::new(
            RoomId::new("ABC123".to_string()).unwrap(),
            RoomConfig::new("frontier".to_string(), None, Language::Ru, 6).unwrap(),
            PlayerName::new("alice".to_string()).unwrap(),
            Timestamp::new(1_000),
        )
    }

    #[test]
    fn test_player_to_dto() {
        // テスト項目: Player の公開フィールドが DTO に写される
        // given (前提条件):
        let room = test_room();
        let host = &room.players[0];

        // when (操作):
        let dto = PlayerDto::from(host);

        // then (期待する結果):
        assert_eq!(dto.id, host.id.as_str());
        assert_eq!(dto.name, "alice");
        assert!(dto.is_host);
        assert!(!dto.is_ready);
        assert_eq!(dto.status, "active");
        assert_eq!(dto.ping_ms, None);
        assert_eq!(dto.country, None);
        assert_eq!(dto.joined_at, 1_000);
    }

    #[test]
    fn test_room_to_state_dto_preserves_join_order() {
        // テスト項目: RoomStateDto の players が参加順を保持する
        // given (前提条件):
        let mut room = test_room();
        room.join_player(
            PlayerName::new("bob".to_string()).unwrap(),
            Timestamp::new(1_001),
        )
        .unwrap();
        room.join_player(
            PlayerName::new("charlie".to_string()).unwrap(),
            Timestamp::new(1_002),
        )
        .unwrap();

        // when (操作):
        let dto = RoomStateDto::from(&room);

        // then (期待する結果):
        assert_eq!(dto.id, "ABC123");
        assert_eq!(dto.phase, "lobby");
        assert_eq!(dto.language, "ru");
        let names: Vec<&str> = dto.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "charlie"]);
    }

    #[test]
    fn test_room_to_summary_dto() {
        // テスト項目: 一覧用の行にホスト名・人数・RFC 3339 時刻が含まれる
        // given (前提条件):
        let room = test_room();

        // when (操作):
        let summary = RoomSummaryDto::from(&room);

        // then (期待する結果):
        assert_eq!(summary.id, "ABC123");
        assert_eq!(summary.host_name, Some("alice".to_string()));
        assert_eq!(summary.player_count, 1);
        assert!(!summary.has_password);
        assert!(summary.created_at.starts_with("1970-01-01T00:00:01"));
    }

    #[test]
    fn test_chat_message_to_new_message_event() {
        // テスト項目: ChatMessage が new_message イベントに変換される
        // given (前提条件):
        let sender = PlayerId::generate();
        let message = ChatMessage::new(
            RoomId::new("ABC123".to_string()).unwrap(),
            sender.clone(),
            PlayerName::new("alice".to_string()).unwrap(),
            MessageContent::new("hello".to_string()).unwrap(),
            None,
            Timestamp::new(2_000),
        );

        // when (操作):
        let event = ServerEvent::from(&message);

        // then (期待する結果):
        match event {
            ServerEvent::NewMessage {
                sender_id,
                sender_name,
                content,
                target_player_id,
                created_at,
                ..
            } => {
                assert_eq!(sender_id, sender.as_str());
                assert_eq!(sender_name, "alice");
                assert_eq!(content, "hello");
                assert_eq!(target_player_id, None);
                assert_eq!(created_at, 2_000);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
