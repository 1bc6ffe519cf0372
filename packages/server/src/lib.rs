//! Genkan lobby synchronization server.
//!
//! This library implements the real-time lobby layer for a session-based
//! multiplayer game: room discovery, join/leave/kick, readiness tracking,
//! chat and the single lobby-to-game start transition, delivered to all
//! connected clients over WebSocket.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
