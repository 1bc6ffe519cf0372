//! ドメイン層
//!
//! ロビーのデータモデル・不変条件と、UseCase 層が依存する
//! インターフェース（Repository / Broadcaster / Presence）を定義します。

pub mod broadcaster;
pub mod entity;
pub mod error;
pub mod presence;
pub mod repository;
pub mod value_object;

pub use broadcaster::{PusherChannel, RoomBroadcaster};
pub use entity::{
    ChatMessage, JoinOutcome, MAX_PLAYERS, MIN_PLAYERS, MIN_PLAYERS_TO_START, Player, ReadyChange,
    RemovalOutcome, Room, RoomConfig, StartOutcome,
};
pub use error::{LobbyError, MessagePushError, PresenceError};
pub use presence::{PresenceStore, PresenceTracker};
pub use repository::RoomRepository;
pub use value_object::{
    COUNTRY_POOL, ConnectionId, CountryDef, GamePhase, Language, MAX_MESSAGE_LEN,
    MAX_PLAYER_NAME_LEN, MAX_PING_MS, MessageContent, PingMs, PlayerId, PlayerName, PlayerStatus,
    ROOM_ID_LEN, RoomId, RoomIdFactory, Timestamp,
};
