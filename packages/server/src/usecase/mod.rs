//! UseCase 層
//!
//! ロビーの各操作を 1 ユースケース 1 モジュールで提供します。
//! 各ユースケースはドメイン層の trait（Repository / Broadcaster /
//! PresenceTracker）にのみ依存し、変更系の Repository 呼び出しを
//! 1 操作につき 1 回だけ行います。ルーム単位の線形化はこの規律と
//! per-room ロックの組み合わせで成立します。
//!
//! ブロードキャストの内容（イベント JSON）は UI 層が組み立て、
//! ユースケースは「誰に届けるか」だけを決めます。

mod connect_player;
mod create_room;
mod disconnect_player;
mod get_room_detail;
mod join_room;
mod kick_player;
mod leave_room;
mod list_rooms;
mod send_message;
mod set_ready;
mod start_game;
mod update_ping;

pub use connect_player::ConnectPlayerUseCase;
pub use create_room::CreateRoomUseCase;
pub use disconnect_player::DisconnectPlayerUseCase;
pub use get_room_detail::GetRoomDetailUseCase;
pub use join_room::JoinRoomUseCase;
pub use kick_player::KickPlayerUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use list_rooms::ListRoomsUseCase;
pub use send_message::SendMessageUseCase;
pub use set_ready::SetReadyUseCase;
pub use start_game::StartGameUseCase;
pub use update_ping::UpdatePingUseCase;
