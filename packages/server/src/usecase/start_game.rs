//! UseCase: ゲーム開始
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - StartGameUseCase::execute() メソッド
//! - `lobby -> started` の一度きりの遷移と国割り当て
//!
//! ### なぜこのテストが必要か
//! - 開始はこのコアで唯一の不可逆な操作であり、二重実行（同時の
//!   start 要求）で国割り当てが 2 回走ってはならない
//! - 権限（ホストのみ）と開始条件（最少人数・全員 ready）の検証が
//!   遷移と同一クリティカルセクションで行われることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：条件成立後の開始と国の一意な割り当て
//! - 異常系：非ホスト、条件未達
//! - エッジケース：ほぼ同時の 2 つの start 要求

use std::sync::Arc;

use crate::domain::{
    LobbyError, PlayerId, RoomBroadcaster, RoomId, RoomRepository, StartOutcome,
};

/// ゲーム開始のユースケース
pub struct StartGameUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Broadcaster（イベント配送の抽象化）
    broadcaster: Arc<dyn RoomBroadcaster>,
}

impl StartGameUseCase {
    /// 新しい StartGameUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        broadcaster: Arc<dyn RoomBroadcaster>,
    ) -> Self {
        Self {
            repository,
            broadcaster,
        }
    }

    /// ゲーム開始を実行
    ///
    /// 権限・開始条件・遷移・国割り当てはルームのロックの内側で
    /// 1 操作として行われます。2 回目の実行は `RoomStarted` になります。
    pub async fn execute(
        &self,
        room_id: &RoomId,
        acting: &PlayerId,
    ) -> Result<StartOutcome, LobbyError> {
        let outcome = self.repository.start_game(room_id, acting).await?;
        tracing::info!(
            "Room '{}' started with {} players",
            room_id,
            outcome.players.len()
        );
        Ok(outcome)
    }

    /// 開始イベントをルーム全員にブロードキャスト
    pub async fn broadcast_game_started(&self, room_id: &RoomId, message: &str) {
        if let Err(e) = self.broadcaster.broadcast_room(room_id, message, None).await {
            tracing::warn!("Failed to broadcast game_started: {}", e);
        }
    }
}
