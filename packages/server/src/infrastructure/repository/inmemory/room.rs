//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! レジストリは `RoomId -> Arc<Mutex<Room>>` のテーブルで、
//! ルームごとに独立したロックを持ちます（arena-with-id）。
//!
//! ## ロック規律
//!
//! - レジストリのロックはルームハンドルの解決（と採番の衝突チェック）の間だけ保持する
//! - 各操作の本体は対象ルームのロックの内側で実行する
//! - ルームロックを保持したまま別のルームやネットワーク I/O に触れない
//!
//! これにより同一ルームへの操作は線形化され、別ルームへの操作は並行に進みます。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use genkan_shared::time::{Clock, SystemClock};

use crate::domain::{
    JoinOutcome, LobbyError, PingMs, Player, PlayerId, PlayerName, PlayerStatus, ReadyChange,
    RemovalOutcome, Room, RoomConfig, RoomId, RoomIdFactory, RoomRepository, StartOutcome,
    Timestamp,
};

/// 採番リトライの上限（6 文字 36 種でレジストリは小さく、実質到達しない）
const ID_GENERATION_ATTEMPTS: usize = 16;

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    /// ルームレジストリ（ルームごとに独立したロック）
    rooms: Mutex<HashMap<RoomId, Arc<Mutex<Room>>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// テスト用: 任意の Clock を注入して作成
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_utc_millis())
    }

    /// ルームハンドルを解決（レジストリロックはこの間だけ）
    async fn room_handle(&self, room_id: &RoomId) -> Result<Arc<Mutex<Room>>, LobbyError> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).cloned().ok_or(LobbyError::NotFound)
    }
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create_room(
        &self,
        config: RoomConfig,
        host_name: PlayerName,
    ) -> Result<Room, LobbyError> {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;

        // 衝突チェック付きの採番
        let mut room_id = None;
        for _ in 0..ID_GENERATION_ATTEMPTS {
            let candidate = RoomIdFactory::generate();
            if !rooms.contains_key(&candidate) {
                room_id = Some(candidate);
                break;
            }
        }
        let room_id = room_id.ok_or_else(|| {
            LobbyError::Internal("failed to allocate a unique room id".to_string())
        })?;

        let room = Room::new(room_id.clone(), config, host_name, now);
        rooms.insert(room_id, Arc::new(Mutex::new(room.clone())));
        Ok(room)
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Room, LobbyError> {
        let handle = self.room_handle(room_id).await?;
        let room = handle.lock().await;
        Ok(room.clone())
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let handles: Vec<Arc<Mutex<Room>>> = {
            let rooms = self.rooms.lock().await;
            rooms.values().cloned().collect()
        };

        let mut result = Vec::with_capacity(handles.len());
        for handle in handles {
            result.push(handle.lock().await.clone());
        }
        // 作成順で安定した一覧にする
        result.sort_by_key(|r| r.created_at);
        result
    }

    async fn join_room(
        &self,
        room_id: &RoomId,
        player_name: PlayerName,
        password: Option<String>,
    ) -> Result<(JoinOutcome, Room), LobbyError> {
        let now = self.now();
        let handle = self.room_handle(room_id).await?;
        let mut room = handle.lock().await;
        room.verify_password(password.as_deref())?;
        let outcome = room.join_player(player_name, now)?;
        Ok((outcome, room.clone()))
    }

    async fn attach_player(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        status: PlayerStatus,
    ) -> Result<Room, LobbyError> {
        let handle = self.room_handle(room_id).await?;
        let mut room = handle.lock().await;
        room.set_connectivity(player_id, status)?;
        Ok(room.clone())
    }

    async fn disconnect_player(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<Option<RemovalOutcome>, LobbyError> {
        let handle = self.room_handle(room_id).await?;
        let mut room = handle.lock().await;
        Ok(room.disconnect_player(player_id))
    }

    async fn leave_room(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<Option<RemovalOutcome>, LobbyError> {
        let handle = self.room_handle(room_id).await?;
        let mut room = handle.lock().await;
        Ok(room.remove_player(player_id))
    }

    async fn kick_player(
        &self,
        room_id: &RoomId,
        acting: &PlayerId,
        target: &PlayerId,
    ) -> Result<RemovalOutcome, LobbyError> {
        let handle = self.room_handle(room_id).await?;
        let mut room = handle.lock().await;
        room.kick(acting, target)
    }

    async fn set_ready(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        is_ready: bool,
    ) -> Result<ReadyChange, LobbyError> {
        let handle = self.room_handle(room_id).await?;
        let mut room = handle.lock().await;
        room.set_ready(player_id, is_ready)
    }

    async fn update_ping(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        ping: PingMs,
    ) -> Result<(), LobbyError> {
        let handle = self.room_handle(room_id).await?;
        let mut room = handle.lock().await;
        room.update_ping(player_id, ping)
    }

    async fn start_game(
        &self,
        room_id: &RoomId,
        acting: &PlayerId,
    ) -> Result<StartOutcome, LobbyError> {
        let now = self.now();
        let handle = self.room_handle(room_id).await?;
        let mut room = handle.lock().await;
        let mut rng = rand::rng();
        room.start(acting, &mut rng, now)
    }

    async fn verify_member(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<Player, LobbyError> {
        let handle = self.room_handle(room_id).await?;
        let room = handle.lock().await;
        room.find_player(player_id)
            .cloned()
            .ok_or(LobbyError::NotFound)
    }
}
