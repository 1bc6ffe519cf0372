//! UseCase: ルーム参加
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() / broadcast_player_joined() メソッド
//! - パスワード検証・フェーズ検証・ロスター追加の一連の流れ
//!
//! ### なぜこのテストが必要か
//! - 「既存メンバーが新規参加者を知らない」クラスのバグを防ぐ：
//!   `player_joined` は参加前から購読していた接続にのみ届き、
//!   参加者自身は HTTP レスポンスのスナップショットで全体を知る
//! - 失敗経路（NotFound / WrongPassword / RoomStarted / DuplicateName /
//!   CapacityExceeded）がロスターを変更しないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規参加、切断中レコードへの復帰
//! - 異常系：パスワード不一致、開始済みルーム、同名衝突、定員超過

use std::sync::Arc;

use crate::domain::{
    JoinOutcome, LobbyError, PlayerId, PlayerName, Room, RoomBroadcaster, RoomId, RoomRepository,
};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Broadcaster（イベント配送の抽象化）
    broadcaster: Arc<dyn RoomBroadcaster>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        broadcaster: Arc<dyn RoomBroadcaster>,
    ) -> Self {
        Self {
            repository,
            broadcaster,
        }
    }

    /// ルーム参加を実行
    ///
    /// パスワード検証・フェーズ検証・ロスター追加は対象ルームの
    /// ロックの内側で 1 操作として行われます。
    ///
    /// # Returns
    ///
    /// * `Ok((JoinOutcome, Room))` - 参加結果と参加後のスナップショット
    /// * `Err(LobbyError)` - 参加失敗（ロスターは変更されない）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        player_name: PlayerName,
        password: Option<String>,
    ) -> Result<(JoinOutcome, Room), LobbyError> {
        let (outcome, room) = self
            .repository
            .join_room(room_id, player_name, password)
            .await?;
        tracing::info!(
            "Player '{}' joined room '{}'",
            outcome.player().name.as_str(),
            room_id
        );
        Ok((outcome, room))
    }

    /// 参加イベントを既存メンバーにブロードキャスト
    ///
    /// 参加者自身には届けません（本人は参加レスポンスの
    /// authoritative なスナップショットで全体を知るため）。
    pub async fn broadcast_player_joined(
        &self,
        room_id: &RoomId,
        new_player_id: &PlayerId,
        message: &str,
    ) {
        if let Err(e) = self
            .broadcaster
            .broadcast_room(room_id, message, Some(new_player_id))
            .await
        {
            tracing::warn!("Failed to broadcast player_joined: {}", e);
        }
    }
}
