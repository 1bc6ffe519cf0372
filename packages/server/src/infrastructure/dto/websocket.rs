//! WebSocket のイベントエンベロープ
//!
//! 双方向とも `{"event": <名前>, "data": <ペイロード>}` の形で交換します。
//! イベントは閉じた enum（serde の adjacently tagged 表現）として定義し、
//! ペイロードの形を推測するコードを書かずに済むようにします。

use serde::{Deserialize, Serialize};

/// ルーム内のプレイヤーの公開フィールド
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDto {
    pub id: String,
    pub name: String,
    pub is_host: bool,
    pub is_ready: bool,
    pub status: String,
    pub ping_ms: Option<u32>,
    pub country: Option<String>,
    pub country_flag: Option<String>,
    pub attack_troops: u32,
    pub defense_troops: u32,
    pub joined_at: i64,
}

/// ルームの状態スナップショット
///
/// `players` は参加順のまま並びます（クライアント側の決定的な表示順）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStateDto {
    pub id: String,
    pub name: String,
    pub language: String,
    pub max_players: u8,
    pub phase: String,
    pub has_password: bool,
    pub created_at: i64,
    pub players: Vec<PlayerDto>,
}

/// クライアントからサーバーへのイベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    SendMessage {
        content: String,
        #[serde(default)]
        target_player_id: Option<String>,
    },
    UpdatePing {
        ping_ms: i64,
    },
    PlayerReady {
        is_ready: bool,
    },
    StartGame,
    KickPlayer {
        target_player_id: String,
    },
    LeaveRoom,
    Heartbeat,
}

/// サーバーからクライアントへのイベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// 接続確立時の authoritative なルームスナップショット（接続者のみ）
    RoomConnected { room: RoomStateDto },
    /// 新しいプレイヤーの参加（既存メンバーのみが受信する）
    PlayerJoined { player: PlayerDto },
    /// プレイヤーの切断・退室（ホスト再割り当てがあれば同じペイロードで通知）
    PlayerDisconnected {
        player_id: String,
        player_name: String,
        new_host_id: Option<String>,
    },
    /// プレイヤーのキック（切断とは別イベントにして表示を分けられるようにする）
    PlayerKicked {
        player_id: String,
        player_name: String,
    },
    /// キックされた本人への個別通知
    Kicked,
    PlayerReadyChanged {
        player_id: String,
        is_ready: bool,
    },
    /// 開始条件が成立したことの通知（状態変更を伴わない）
    AllPlayersReady,
    PingUpdated {
        player_id: String,
        ping_ms: u32,
    },
    NewMessage {
        id: String,
        sender_id: String,
        sender_name: String,
        content: String,
        target_player_id: Option<String>,
        created_at: i64,
    },
    /// ロビーからゲームへの遷移（国割り当て済みの最終ロスターを含む）
    GameStarted {
        phase: String,
        players: Vec<PlayerDto>,
    },
    /// リクエスト単位の失敗（起こした接続にのみ返す）
    Error { code: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_envelope_format() {
        // テスト項目: クライアントイベントが {"event", "data"} 形式で解釈される
        // given (前提条件):
        let json = r#"{"event":"player_ready","data":{"is_ready":true}}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(event, ClientEvent::PlayerReady { is_ready: true });
    }

    #[test]
    fn test_client_event_without_data() {
        // テスト項目: ペイロードのないイベントがイベント名だけで解釈される
        // given (前提条件):
        let json = r#"{"event":"start_game"}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(event, ClientEvent::StartGame);
    }

    #[test]
    fn test_send_message_target_is_optional() {
        // テスト項目: target_player_id 省略時は公開メッセージとして解釈される
        // given (前提条件):
        let json = r#"{"event":"send_message","data":{"content":"hello"}}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::SendMessage {
                content: "hello".to_string(),
                target_player_id: None,
            }
        );
    }

    #[test]
    fn test_unknown_event_name_is_rejected() {
        // テスト項目: 未知のイベント名がエラーになる（形の推測をしない）
        // given (前提条件):
        let json = r#"{"event":"launch_missiles","data":{}}"#;

        // when (操作):
        let result = serde_json::from_str::<ClientEvent>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_server_event_uses_snake_case_names() {
        // テスト項目: サーバーイベントのイベント名が snake_case で出力される
        // given (前提条件):
        let event = ServerEvent::AllPlayersReady;

        // when (操作):
        let json = serde_json::to_string(&event).unwrap();

        // then (期待する結果):
        assert_eq!(json, r#"{"event":"all_players_ready"}"#);
    }

    #[test]
    fn test_server_error_event_round_trip() {
        // テスト項目: error イベントが code / message を保って往復できる
        // given (前提条件):
        let event = ServerEvent::Error {
            code: "not_ready".to_string(),
            message: "not all players are ready".to_string(),
        };

        // when (操作):
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ServerEvent = serde_json::from_str(&json).unwrap();

        // then (期待する結果):
        assert_eq!(parsed, event);
        assert!(json.contains(r#""event":"error""#));
    }
}
