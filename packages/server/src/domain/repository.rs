//! Repository trait 定義
//!
//! ドメイン層が必要とするルームレジストリへのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 並行性の契約
//!
//! 各メソッドは対象ルームの排他スコープ内で 1 つのクリティカルセクション
//! として実行されること。UseCase 層は 1 操作につき変更系メソッドを 1 回だけ
//! 呼ぶため、これでルーム単位の線形化が成立します。別ルームへの操作同士を
//! 直列化してはいけません（グローバルロック禁止）。

use async_trait::async_trait;

use super::entity::{JoinOutcome, Player, ReadyChange, RemovalOutcome, Room, RoomConfig, StartOutcome};
use super::error::LobbyError;
use super::value_object::{PingMs, PlayerId, PlayerName, PlayerStatus, RoomId};

/// ルームレジストリへのインターフェース
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームを新規作成し、作成者をホストとして追加
    ///
    /// ルーム ID は衝突チェック付きで採番されます。
    async fn create_room(
        &self,
        config: RoomConfig,
        host_name: PlayerName,
    ) -> Result<Room, LobbyError>;

    /// ルームのスナップショットを取得
    async fn get_room(&self, room_id: &RoomId) -> Result<Room, LobbyError>;

    /// 全ルームのスナップショットを取得
    async fn list_rooms(&self) -> Vec<Room>;

    /// ルームに参加（パスワード検証・フェーズ検証・ロスター追加を 1 操作で）
    async fn join_room(
        &self,
        room_id: &RoomId,
        player_name: PlayerName,
        password: Option<String>,
    ) -> Result<(JoinOutcome, Room), LobbyError>;

    /// 接続の割り当て: メンバー確認のうえ接続状態を設定し、スナップショットを返す
    async fn attach_player(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        status: PlayerStatus,
    ) -> Result<Room, LobbyError>;

    /// プレイヤーを切断扱いにする（冪等、レコードは残る）
    async fn disconnect_player(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<Option<RemovalOutcome>, LobbyError>;

    /// プレイヤーを自発的に退室させる（冪等、レコードを削除）
    async fn leave_room(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<Option<RemovalOutcome>, LobbyError>;

    /// プレイヤーをキック（ホスト専用、レコードを削除）
    async fn kick_player(
        &self,
        room_id: &RoomId,
        acting: &PlayerId,
        target: &PlayerId,
    ) -> Result<RemovalOutcome, LobbyError>;

    /// ready フラグを設定し、開始条件の判定を同一クリティカルセクションで返す
    async fn set_ready(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        is_ready: bool,
    ) -> Result<ReadyChange, LobbyError>;

    /// ping を更新（クランプ済みの値を書き込む）
    async fn update_ping(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        ping: PingMs,
    ) -> Result<(), LobbyError>;

    /// ゲームを開始（一度きりの遷移 + 国割り当てを 1 操作で）
    async fn start_game(
        &self,
        room_id: &RoomId,
        acting: &PlayerId,
    ) -> Result<StartOutcome, LobbyError>;

    /// ルームのメンバーであることを確認し、プレイヤーを返す
    async fn verify_member(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<Player, LobbyError>;
}
