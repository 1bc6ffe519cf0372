//! イベント配送の実装
//!
//! `RoomBroadcaster` trait の具体的な実装を提供します。
//!
//! - `websocket`: WebSocket の sender チャンネルを使った実装
//! - 将来的に: プロセス間ファンアウト（Redis pub/sub など）

pub mod websocket;

pub use websocket::WebSocketBroadcaster;
