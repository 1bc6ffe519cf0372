//! Presence sweeper.
//!
//! クローズフレームを送らずに消えた接続（プロセスクラッシュ、電源断）は
//! ソケットのクローズイベントを発生させないことがあります。期限切れの
//! プレゼンス行を定期的に回収し、明示的なクローズと同じ切断経路に
//! 流します。

use std::sync::Arc;
use std::time::Duration;

use super::handler::websocket::run_disconnect;
use super::state::AppState;

/// 期限切れの接続を回収し続けるタスク
pub async fn run_presence_sweeper(state: Arc<AppState>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // interval の最初の tick は即座に返る
    ticker.tick().await;

    loop {
        ticker.tick().await;
        for (player_id, room_id) in state.presence_tracker.take_expired().await {
            tracing::info!(
                "Presence expired for player '{}' in room '{}', forcing disconnect",
                player_id,
                room_id
            );
            run_disconnect(&state, &room_id, &player_id, None).await;
        }
    }
}
