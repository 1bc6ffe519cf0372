//! インメモリの短命 KV ストア実装
//!
//! `PresenceStore` trait（set-with-TTL / get / delete）のプロセス内実装。
//! 単一プロセス構成ではこれで十分であり、trait が Redis などの外部ストア
//! （および将来のプロセス間ファンアウト）への継ぎ目になります。
//!
//! 期限切れは get 時に遅延評価で回収します（バックグラウンドの
//! 掃除タスクは持ちません）。

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{PresenceError, PresenceStore};

struct StoreEntry {
    value: String,
    expires_at: Instant,
}

/// インメモリ PresenceStore 実装
pub struct InMemoryPresenceStore {
    entries: Mutex<HashMap<String, StoreEntry>>,
}

impl InMemoryPresenceStore {
    /// 新しい InMemoryPresenceStore を作成
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPresenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PresenceStore for InMemoryPresenceStore {
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), PresenceError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            StoreEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, PresenceError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                // 期限切れの行は読み出し時に回収する
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), PresenceError> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get_within_ttl() {
        // テスト項目: TTL 内の値が取得できる
        // given (前提条件):
        let store = InMemoryPresenceStore::new();
        store
            .set_with_expiry("presence:alice", "ABC123", Duration::from_secs(30))
            .await
            .unwrap();

        // when (操作):
        let value = store.get("presence:alice").await.unwrap();

        // then (期待する結果):
        assert_eq!(value, Some("ABC123".to_string()));
    }

    #[tokio::test]
    async fn test_expired_entry_is_gone() {
        // テスト項目: TTL を過ぎた値が取得できない（遅延回収）
        // given (前提条件):
        let store = InMemoryPresenceStore::new();
        store
            .set_with_expiry("presence:alice", "ABC123", Duration::from_millis(10))
            .await
            .unwrap();

        // when (操作):
        tokio::time::sleep(Duration::from_millis(30)).await;
        let value = store.get("presence:alice").await.unwrap();

        // then (期待する結果):
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_set_refreshes_expiry() {
        // テスト項目: 再 set で期限が延長される
        // given (前提条件):
        let store = InMemoryPresenceStore::new();
        store
            .set_with_expiry("presence:alice", "ABC123", Duration::from_millis(20))
            .await
            .unwrap();

        // when (操作): 期限が切れる前に再 set
        tokio::time::sleep(Duration::from_millis(10)).await;
        store
            .set_with_expiry("presence:alice", "ABC123", Duration::from_secs(30))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // then (期待する結果): 元の TTL を過ぎても値が残っている
        assert_eq!(
            store.get("presence:alice").await.unwrap(),
            Some("ABC123".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        // テスト項目: delete 後の値が取得できない
        // given (前提条件):
        let store = InMemoryPresenceStore::new();
        store
            .set_with_expiry("presence:alice", "ABC123", Duration::from_secs(30))
            .await
            .unwrap();

        // when (操作):
        store.delete("presence:alice").await.unwrap();

        // then (期待する結果):
        assert_eq!(store.get("presence:alice").await.unwrap(), None);
    }
}
