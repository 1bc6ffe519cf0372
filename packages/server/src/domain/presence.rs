//! プレゼンス（接続の生存管理）のインターフェース
//!
//! 接続 ↔ (ルーム, プレイヤー) の短命な対応表と、TTL リフレッシュモデルを
//! 定義します。期限内にリフレッシュ（ping / heartbeat）が届かない接続は、
//! 明示的なクローズと同じ切断経路に流されます。
//!
//! ## 外部ストアとの関係
//!
//! 行の実体は外部の短命 KV（`PresenceStore`）にもミラーされます。
//! 単一プロセス構成では必須ではありませんが、将来プロセス間の
//! pub/sub ファンアウトを接続する場合の継ぎ目になります。

use std::time::Duration;

use async_trait::async_trait;

use super::error::PresenceError;
use super::value_object::{PlayerId, RoomId};

/// 外部の短命 KV ストア（set-with-TTL / get / delete のみを要求）
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// TTL 付きで値を保存
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), PresenceError>;

    /// 値を取得（期限切れは None）
    async fn get(&self, key: &str) -> Result<Option<String>, PresenceError>;

    /// キーを削除
    async fn delete(&self, key: &str) -> Result<(), PresenceError>;
}

/// 接続の生存管理
#[async_trait]
pub trait PresenceTracker: Send + Sync {
    /// プレイヤーの接続を登録し、期限を開始する
    async fn track(&self, player_id: PlayerId, room_id: RoomId) -> Result<(), PresenceError>;

    /// 期限をリフレッシュする（ping / heartbeat 受信時）
    async fn refresh(&self, player_id: &PlayerId) -> Result<(), PresenceError>;

    /// 登録を解除する（冪等）
    async fn untrack(&self, player_id: &PlayerId) -> Result<(), PresenceError>;

    /// 期限切れの行を回収する（回収された行は登録から消える）
    async fn take_expired(&self) -> Vec<(PlayerId, RoomId)>;
}
