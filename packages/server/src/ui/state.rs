//! Server state shared across handlers.

use std::sync::Arc;

use crate::domain::PresenceTracker;
use crate::usecase::{
    ConnectPlayerUseCase, CreateRoomUseCase, DisconnectPlayerUseCase, GetRoomDetailUseCase,
    JoinRoomUseCase, KickPlayerUseCase, LeaveRoomUseCase, ListRoomsUseCase, SendMessageUseCase,
    SetReadyUseCase, StartGameUseCase, UpdatePingUseCase,
};

/// Shared application state
pub struct AppState {
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    pub list_rooms_usecase: Arc<ListRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub connect_player_usecase: Arc<ConnectPlayerUseCase>,
    pub disconnect_player_usecase: Arc<DisconnectPlayerUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub kick_player_usecase: Arc<KickPlayerUseCase>,
    pub set_ready_usecase: Arc<SetReadyUseCase>,
    pub start_game_usecase: Arc<StartGameUseCase>,
    pub update_ping_usecase: Arc<UpdatePingUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// heartbeat の期限更新と sweeper の回収に使う
    pub presence_tracker: Arc<dyn PresenceTracker>,
}
