//! Lobby server UI layer (connection gateway).
//!
//! HTTP API, WebSocket upgrade, event envelope decoding and the
//! presence sweeper. Socket lifecycle hooks always run the disconnect
//! use case, even on abnormal closure.

mod handler;
mod server;
mod signal;
mod sweeper;
pub mod state; // UseCase 層と sweeper からアクセスするため public

pub use server::Server;
