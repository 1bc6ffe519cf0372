//! HTTP and WebSocket handlers.

pub mod http;
pub mod websocket;

pub use http::{create_room, get_room_detail, health_check, join_room, list_rooms};
pub use websocket::websocket_handler;
