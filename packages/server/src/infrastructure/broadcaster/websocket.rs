//! WebSocket を使った RoomBroadcaster 実装
//!
//! ## 責務
//!
//! - プレイヤーごとの WebSocket sender（`UnboundedSender`）の管理
//! - ルーム単位の購読テーブルの管理
//! - ルーム内へのファンアウト（broadcast_room, push_to）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された sender を受け取り、イベント配送にのみ使用します。
//! 送信はチャンネルへのエンキューであり、ネットワーク I/O をロックの
//! 内側で待つことはありません。受信側は接続ごとの pusher タスクが
//! drain し、順番に WebSocket へ書き出します。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, MessagePushError, PlayerId, PusherChannel, RoomBroadcaster, RoomId,
};

/// 1 本のライブな接続
struct ConnectionEntry {
    connection_id: ConnectionId,
    room_id: RoomId,
    sender: PusherChannel,
}

/// 接続テーブルと購読テーブル
///
/// subscribe / unsubscribe は進行中の emit と競合しうるため、
/// 両テーブルを 1 つのロックで守り、常に整合した状態を見せます。
#[derive(Default)]
struct BroadcasterState {
    /// プレイヤーにつきライブな接続は常に 1 本
    connections: HashMap<PlayerId, ConnectionEntry>,
    /// ルーム -> 購読中のプレイヤー集合
    rooms: HashMap<RoomId, HashSet<PlayerId>>,
}

impl BroadcasterState {
    fn remove(&mut self, player_id: &PlayerId) -> Option<ConnectionEntry> {
        let entry = self.connections.remove(player_id)?;
        if let Some(members) = self.rooms.get_mut(&entry.room_id) {
            members.remove(player_id);
            if members.is_empty() {
                self.rooms.remove(&entry.room_id);
            }
        }
        Some(entry)
    }
}

/// WebSocket を使った RoomBroadcaster 実装
pub struct WebSocketBroadcaster {
    state: Mutex<BroadcasterState>,
}

impl WebSocketBroadcaster {
    /// 新しい WebSocketBroadcaster を作成
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BroadcasterState::default()),
        }
    }
}

impl Default for WebSocketBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomBroadcaster for WebSocketBroadcaster {
    async fn attach(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) {
        let mut state = self.state.lock().await;
        // 同一プレイヤーの既存の接続は新しい接続で置き換える
        if state.remove(&player_id).is_some() {
            tracing::debug!(
                "Superseding existing connection for player '{}'",
                player_id
            );
        }
        state
            .rooms
            .entry(room_id.clone())
            .or_default()
            .insert(player_id.clone());
        state.connections.insert(
            player_id.clone(),
            ConnectionEntry {
                connection_id,
                room_id,
                sender,
            },
        );
        tracing::debug!("Player '{}' attached to broadcaster", player_id);
    }

    async fn detach(&self, player_id: &PlayerId) -> bool {
        let mut state = self.state.lock().await;
        let removed = state.remove(player_id).is_some();
        if removed {
            tracing::debug!("Player '{}' detached from broadcaster", player_id);
        }
        removed
    }

    async fn detach_if_current(&self, player_id: &PlayerId, connection_id: &ConnectionId) -> bool {
        let mut state = self.state.lock().await;
        match state.connections.get(player_id) {
            Some(entry) if &entry.connection_id == connection_id => {
                state.remove(player_id);
                tracing::debug!("Player '{}' detached from broadcaster", player_id);
                true
            }
            // 既に新しい接続で置き換えられている（古い接続のクローズは無視）
            _ => false,
        }
    }

    async fn broadcast_room(
        &self,
        room_id: &RoomId,
        content: &str,
        exclude: Option<&PlayerId>,
    ) -> Result<(), MessagePushError> {
        let state = self.state.lock().await;
        let Some(members) = state.rooms.get(room_id) else {
            // 購読者のいないルームへの emit は no-op
            return Ok(());
        };

        for member in members {
            if Some(member) == exclude {
                continue;
            }
            if let Some(entry) = state.connections.get(member) {
                // ブロードキャストでは一部の送信失敗を許容
                if let Err(e) = entry.sender.send(content.to_string()) {
                    tracing::warn!("Failed to push event to player '{}': {}", member, e);
                }
            }
        }

        Ok(())
    }

    async fn push_to(&self, player_id: &PlayerId, content: &str) -> Result<(), MessagePushError> {
        let state = self.state.lock().await;

        if let Some(entry) = state.connections.get(player_id) {
            entry
                .sender
                .send(content.to_string())
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            Ok(())
        } else {
            Err(MessagePushError::ClientNotFound(
                player_id.as_str().to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - ルーム単位のファンアウト（exclude 付き / なし）
    // - ルーム間の分離（別ルームの購読者に届かないこと）
    // - 再接続による置き換え（supersede）と detach_if_current の判定
    // - push_to のエラーハンドリング
    //
    // 【なぜこのテストが必要か】
    // - Broadcaster は全イベント配送の通り道であり、「誰に届くか」の
    //   保証はここで崩れると全シナリオが崩れる
    // - 切断とブロードキャストの競合を 1 つのロックで守る設計の検証
    // ========================================

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    async fn attach_client(
        broadcaster: &WebSocketBroadcaster,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = ConnectionId::generate();
        broadcaster
            .attach(
                room_id.clone(),
                player_id.clone(),
                connection_id.clone(),
                tx,
            )
            .await;
        (connection_id, rx)
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_room_members() {
        // テスト項目: ルーム内の全購読者にイベントが届く
        // given (前提条件):
        let broadcaster = WebSocketBroadcaster::new();
        let room_id = room("ABC123");
        let alice = PlayerId::generate();
        let bob = PlayerId::generate();
        let (_, mut rx_alice) = attach_client(&broadcaster, &room_id, &alice).await;
        let (_, mut rx_bob) = attach_client(&broadcaster, &room_id, &bob).await;

        // when (操作):
        broadcaster
            .broadcast_room(&room_id, "event", None)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(rx_alice.recv().await, Some("event".to_string()));
        assert_eq!(rx_bob.recv().await, Some("event".to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_excludes_sender() {
        // テスト項目: exclude に指定したプレイヤーにはイベントが届かない
        // given (前提条件):
        let broadcaster = WebSocketBroadcaster::new();
        let room_id = room("ABC123");
        let alice = PlayerId::generate();
        let bob = PlayerId::generate();
        let (_, mut rx_alice) = attach_client(&broadcaster, &room_id, &alice).await;
        let (_, mut rx_bob) = attach_client(&broadcaster, &room_id, &bob).await;

        // when (操作):
        broadcaster
            .broadcast_room(&room_id, "event", Some(&alice))
            .await
            .unwrap();

        // then (期待する結果): bob には届き、alice には届かない
        assert_eq!(rx_bob.recv().await, Some("event".to_string()));
        assert!(rx_alice.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_does_not_cross_rooms() {
        // テスト項目: 別ルームの購読者にはイベントが届かない
        // given (前提条件):
        let broadcaster = WebSocketBroadcaster::new();
        let room_a = room("AAAAAA");
        let room_b = room("BBBBBB");
        let alice = PlayerId::generate();
        let bob = PlayerId::generate();
        let (_, mut rx_alice) = attach_client(&broadcaster, &room_a, &alice).await;
        let (_, mut rx_bob) = attach_client(&broadcaster, &room_b, &bob).await;

        // when (操作):
        broadcaster
            .broadcast_room(&room_a, "event", None)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(rx_alice.recv().await, Some("event".to_string()));
        assert!(rx_bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_detached_player_stops_receiving() {
        // テスト項目: detach 後のプレイヤーにはイベントが届かない
        // given (前提条件):
        let broadcaster = WebSocketBroadcaster::new();
        let room_id = room("ABC123");
        let alice = PlayerId::generate();
        let bob = PlayerId::generate();
        let (_, mut rx_alice) = attach_client(&broadcaster, &room_id, &alice).await;
        let (_, _rx_bob) = attach_client(&broadcaster, &room_id, &bob).await;

        // when (操作):
        assert!(broadcaster.detach(&alice).await);
        broadcaster
            .broadcast_room(&room_id, "event", None)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(rx_alice.try_recv().is_err());
        // 2 回目の detach は no-op
        assert!(!broadcaster.detach(&alice).await);
    }

    #[tokio::test]
    async fn test_reconnect_supersedes_old_connection() {
        // テスト項目: 再接続で古い接続が置き換えられ、イベントは新しい接続に届く
        // given (前提条件):
        let broadcaster = WebSocketBroadcaster::new();
        let room_id = room("ABC123");
        let alice = PlayerId::generate();
        let (old_conn, mut rx_old) = attach_client(&broadcaster, &room_id, &alice).await;
        let (_, mut rx_new) = attach_client(&broadcaster, &room_id, &alice).await;

        // when (操作):
        broadcaster
            .broadcast_room(&room_id, "event", None)
            .await
            .unwrap();

        // then (期待する結果): 新しい接続にのみ届く
        assert_eq!(rx_new.recv().await, Some("event".to_string()));
        assert!(rx_old.try_recv().is_err());

        // 古い接続のクローズ（detach_if_current）は新しい購読を壊さない
        assert!(!broadcaster.detach_if_current(&alice, &old_conn).await);
        broadcaster
            .broadcast_room(&room_id, "again", None)
            .await
            .unwrap();
        assert_eq!(rx_new.recv().await, Some("again".to_string()));
    }

    #[tokio::test]
    async fn test_detach_if_current_removes_current_connection() {
        // テスト項目: 現在の接続の detach_if_current は購読を解除する
        // given (前提条件):
        let broadcaster = WebSocketBroadcaster::new();
        let room_id = room("ABC123");
        let alice = PlayerId::generate();
        let (conn, _rx) = attach_client(&broadcaster, &room_id, &alice).await;

        // when (操作):
        let detached = broadcaster.detach_if_current(&alice, &conn).await;

        // then (期待する結果):
        assert!(detached);
        assert!(matches!(
            broadcaster.push_to(&alice, "event").await,
            Err(MessagePushError::ClientNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_push_to_unknown_player_fails() {
        // テスト項目: 登録されていないプレイヤーへの push_to がエラーになる
        // given (前提条件):
        let broadcaster = WebSocketBroadcaster::new();
        let ghost = PlayerId::generate();

        // when (操作):
        let result = broadcaster.push_to(&ghost, "event").await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::ClientNotFound(_))));
    }

    #[tokio::test]
    async fn test_broadcast_to_empty_room_is_noop() {
        // テスト項目: 購読者のいないルームへの broadcast がエラーにならない
        // given (前提条件):
        let broadcaster = WebSocketBroadcaster::new();

        // when (操作):
        let result = broadcaster.broadcast_room(&room("EMPTY0"), "event", None).await;

        // then (期待する結果):
        assert!(result.is_ok());
    }
}
