//! Lobby synchronization server for session-based multiplayer games.
//!
//! Hosts rooms of 4-10 players, keeps every connected client's view of the
//! roster consistent and performs the single lobby-to-game start transition.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin genkan-server
//! cargo run --bin genkan-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use genkan_server::{
    infrastructure::{
        broadcaster::WebSocketBroadcaster,
        presence::{InMemoryPresenceStore, TtlPresenceTracker},
        repository::InMemoryRoomRepository,
    },
    ui::{Server, state::AppState},
    usecase::{
        ConnectPlayerUseCase, CreateRoomUseCase, DisconnectPlayerUseCase, GetRoomDetailUseCase,
        JoinRoomUseCase, KickPlayerUseCase, LeaveRoomUseCase, ListRoomsUseCase,
        SendMessageUseCase, SetReadyUseCase, StartGameUseCase, UpdatePingUseCase,
    },
};
use genkan_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Lobby synchronization server for multiplayer sessions", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Heartbeat window in seconds before a silent connection is reaped
    #[arg(long, default_value = "30")]
    presence_ttl_secs: u64,

    /// Interval in seconds between presence sweeps
    #[arg(long, default_value = "10")]
    sweep_interval_secs: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repository / Broadcaster / Presence
    // 2. UseCases
    // 3. AppState
    // 4. Server

    // 1. Infrastructure
    let repository = Arc::new(InMemoryRoomRepository::new());
    let broadcaster = Arc::new(WebSocketBroadcaster::new());
    let presence_store = Arc::new(InMemoryPresenceStore::new());
    let presence_tracker = Arc::new(TtlPresenceTracker::new(
        Duration::from_secs(args.presence_ttl_secs),
        presence_store,
    ));

    // 2. UseCases
    let create_room_usecase = Arc::new(CreateRoomUseCase::new(repository.clone()));
    let list_rooms_usecase = Arc::new(ListRoomsUseCase::new(repository.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(repository.clone()));
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        repository.clone(),
        broadcaster.clone(),
    ));
    let connect_player_usecase = Arc::new(ConnectPlayerUseCase::new(
        repository.clone(),
        broadcaster.clone(),
        presence_tracker.clone(),
    ));
    let disconnect_player_usecase = Arc::new(DisconnectPlayerUseCase::new(
        repository.clone(),
        broadcaster.clone(),
        presence_tracker.clone(),
    ));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(
        repository.clone(),
        broadcaster.clone(),
        presence_tracker.clone(),
    ));
    let kick_player_usecase = Arc::new(KickPlayerUseCase::new(
        repository.clone(),
        broadcaster.clone(),
        presence_tracker.clone(),
    ));
    let set_ready_usecase = Arc::new(SetReadyUseCase::new(
        repository.clone(),
        broadcaster.clone(),
    ));
    let start_game_usecase = Arc::new(StartGameUseCase::new(
        repository.clone(),
        broadcaster.clone(),
    ));
    let update_ping_usecase = Arc::new(UpdatePingUseCase::new(
        repository.clone(),
        broadcaster.clone(),
        presence_tracker.clone(),
    ));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        repository.clone(),
        broadcaster.clone(),
    ));

    // 3. AppState
    let state = AppState {
        create_room_usecase,
        list_rooms_usecase,
        get_room_detail_usecase,
        join_room_usecase,
        connect_player_usecase,
        disconnect_player_usecase,
        leave_room_usecase,
        kick_player_usecase,
        set_ready_usecase,
        start_game_usecase,
        update_ping_usecase,
        send_message_usecase,
        presence_tracker,
    };

    // 4. Create and run the server
    let server = Server::new(state, Duration::from_secs(args.sweep_interval_secs));
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
