//! ルーム単位のイベント配送インターフェース
//!
//! ドメイン層が必要とする「誰に届けるか」の抽象化を定義します。
//! WebSocket などの具体的なトランスポートは Infrastructure 層が実装します。
//!
//! ## 配送の保証
//!
//! - emit は呼び出し時点で購読している接続へのエンキューを保証する
//! - 同一操作が発行した複数イベントの接続ごとの順序は保持される
//! - 送信はチャンネルへのエンキューのみ（ネットワーク I/O を待たない）

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::MessagePushError;
use super::value_object::{ConnectionId, PlayerId, RoomId};

/// クライアントへの送信チャンネル
///
/// 受信側は接続ごとの pusher タスクが drain し、WebSocket へ書き出します。
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// ルーム単位のイベント配送
#[async_trait]
pub trait RoomBroadcaster: Send + Sync {
    /// 接続をプレイヤーに紐付け、ルームに購読させる
    ///
    /// 同一プレイヤーの既存の接続があれば新しい接続で置き換えます
    /// （プレイヤーにつきライブな接続は常に 1 本）。
    async fn attach(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    );

    /// 接続を無条件に解除（購読も解除される）
    ///
    /// 戻り値は接続が登録されていたかどうか。
    async fn detach(&self, player_id: &PlayerId) -> bool;

    /// 指定した接続が現在の紐付けである場合のみ解除
    ///
    /// 再接続で置き換えられた古い接続のクローズが、新しい接続の購読を
    /// 壊さないための判定です。解除した場合 true。
    async fn detach_if_current(&self, player_id: &PlayerId, connection_id: &ConnectionId) -> bool;

    /// ルームの購読者全員（exclude を除く）へイベントをエンキュー
    ///
    /// 一部の接続への送信失敗は許容し、ログに残すのみとします。
    async fn broadcast_room(
        &self,
        room_id: &RoomId,
        content: &str,
        exclude: Option<&PlayerId>,
    ) -> Result<(), MessagePushError>;

    /// 特定のプレイヤーの接続へイベントをエンキュー
    async fn push_to(&self, player_id: &PlayerId, content: &str) -> Result<(), MessagePushError>;
}
