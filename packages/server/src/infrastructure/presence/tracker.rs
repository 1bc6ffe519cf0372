//! TTL リフレッシュモデルの PresenceTracker 実装
//!
//! プレイヤーの接続ごとに期限付きの行を持ち、ping / heartbeat の受信で
//! 期限を更新します。期限内にリフレッシュが届かなかった行は
//! `take_expired` で回収され、呼び出し元（sweeper）が明示的なクローズと
//! 同じ切断経路に流します。
//!
//! 行は外部ストア（`PresenceStore`）にも `presence:{player_id}` キーで
//! ミラーされます。ストア側の失敗は接続の生存判定を壊さないよう、
//! ログに残したうえで伝播させます（呼び出し側の方針で無視できる）。

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{PlayerId, PresenceError, PresenceStore, PresenceTracker, RoomId};

struct PresenceRow {
    room_id: RoomId,
    deadline: Instant,
}

/// TTL ベースの PresenceTracker 実装
pub struct TtlPresenceTracker {
    ttl: Duration,
    rows: Mutex<HashMap<PlayerId, PresenceRow>>,
    store: Arc<dyn PresenceStore>,
}

impl TtlPresenceTracker {
    /// 新しい TtlPresenceTracker を作成
    pub fn new(ttl: Duration, store: Arc<dyn PresenceStore>) -> Self {
        Self {
            ttl,
            rows: Mutex::new(HashMap::new()),
            store,
        }
    }

    fn store_key(player_id: &PlayerId) -> String {
        format!("presence:{}", player_id.as_str())
    }
}

#[async_trait]
impl PresenceTracker for TtlPresenceTracker {
    async fn track(&self, player_id: PlayerId, room_id: RoomId) -> Result<(), PresenceError> {
        let key = Self::store_key(&player_id);
        let value = room_id.as_str().to_string();
        {
            let mut rows = self.rows.lock().await;
            rows.insert(
                player_id,
                PresenceRow {
                    room_id,
                    deadline: Instant::now() + self.ttl,
                },
            );
        }
        self.store.set_with_expiry(&key, &value, self.ttl).await
    }

    async fn refresh(&self, player_id: &PlayerId) -> Result<(), PresenceError> {
        let room_id = {
            let mut rows = self.rows.lock().await;
            match rows.get_mut(player_id) {
                Some(row) => {
                    row.deadline = Instant::now() + self.ttl;
                    row.room_id.clone()
                }
                // 追跡されていないプレイヤーの heartbeat は無視する
                None => return Ok(()),
            }
        };
        self.store
            .set_with_expiry(
                &Self::store_key(player_id),
                room_id.as_str(),
                self.ttl,
            )
            .await
    }

    async fn untrack(&self, player_id: &PlayerId) -> Result<(), PresenceError> {
        let present = {
            let mut rows = self.rows.lock().await;
            rows.remove(player_id).is_some()
        };
        if present {
            self.store.delete(&Self::store_key(player_id)).await?;
        }
        Ok(())
    }

    async fn take_expired(&self) -> Vec<(PlayerId, RoomId)> {
        let now = Instant::now();
        let expired: Vec<(PlayerId, RoomId)> = {
            let mut rows = self.rows.lock().await;
            let lapsed: Vec<PlayerId> = rows
                .iter()
                .filter(|(_, row)| row.deadline <= now)
                .map(|(id, _)| id.clone())
                .collect();
            lapsed
                .into_iter()
                .filter_map(|id| rows.remove(&id).map(|row| (id, row.room_id)))
                .collect()
        };

        for (player_id, _) in &expired {
            if let Err(e) = self.store.delete(&Self::store_key(player_id)).await {
                tracing::warn!(
                    "Failed to delete presence row for player '{}': {}",
                    player_id,
                    e
                );
            }
        }

        expired
    }
}
