//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, LobbyError, PlayerId, PusherChannel, Room, RoomId},
    infrastructure::dto::websocket::{ClientEvent, PlayerDto, RoomStateDto, ServerEvent},
    ui::state::AppState,
};

use serde::Deserialize;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub room_id: String,
    pub player_id: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> Domain Models
    let Ok(room_id) = RoomId::new(query.room_id.clone()) else {
        tracing::warn!("Invalid room_id format: '{}'", query.room_id);
        return Err(StatusCode::BAD_REQUEST);
    };
    let Ok(player_id) = PlayerId::new(query.player_id.clone()) else {
        tracing::warn!("Invalid player_id format: '{}'", query.player_id);
        return Err(StatusCode::BAD_REQUEST);
    };

    // Create a channel for this client to receive room events.
    // A clone is kept for request-local error replies, so they travel the
    // same path as room events and stay ordered per connection.
    let connection_id = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    let reply_tx = tx.clone();

    // Use ConnectPlayerUseCase to bind the connection to (room, player)
    match state
        .connect_player_usecase
        .execute(&room_id, &player_id, connection_id.clone(), tx)
        .await
    {
        Ok((room, resumed)) => Ok(ws.on_upgrade(move |socket| {
            handle_socket(
                socket,
                state,
                room,
                room_id,
                player_id,
                connection_id,
                rx,
                reply_tx,
                resumed,
            )
        })),
        Err(LobbyError::NotFound) => {
            tracing::warn!(
                "Rejecting connection: player '{}' is not a member of room '{}'",
                player_id,
                room_id
            );
            Err(StatusCode::NOT_FOUND)
        }
        Err(e) => {
            tracing::error!("Failed to connect player '{}': {}", player_id, e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Spawns a task that receives events from the rx channel and pushes them to the WebSocket sender.
///
/// This is the only place that writes room events to the socket, so the
/// per-connection ordering of enqueued events is preserved.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

#[allow(clippy::too_many_arguments)]
async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    room: Room,
    room_id: RoomId,
    player_id: PlayerId,
    connection_id: ConnectionId,
    rx: mpsc::UnboundedReceiver<String>,
    reply_tx: PusherChannel,
    resumed: bool,
) {
    let (mut sender, mut receiver) = socket.split();

    // Send the authoritative room snapshot to the newly connected client
    {
        let event = ServerEvent::RoomConnected {
            room: RoomStateDto::from(&room),
        };
        let json = serde_json::to_string(&event).unwrap();
        if let Err(e) = sender.send(Message::Text(json.into())).await {
            tracing::error!("Failed to send room_connected to '{}': {}", player_id, e);
            run_disconnect(&state, &room_id, &player_id, Some(&connection_id)).await;
            return;
        }
    }

    // 切断中だったプレイヤーの復帰は、他のメンバーにロスターの
    // 更新として知らせる（新規参加は HTTP の join が通知済み）
    if resumed {
        if let Some(player) = room.find_player(&player_id) {
            let event = ServerEvent::PlayerJoined {
                player: PlayerDto::from(player),
            };
            let json = serde_json::to_string(&event).unwrap();
            state
                .connect_player_usecase
                .broadcast_reconnected(&room_id, &player_id, &json)
                .await;
        }
    }

    let state_clone = state.clone();
    let room_id_clone = room_id.clone();
    let player_id_clone = player_id.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!("Failed to parse client event: {}", e);
                            reply_error(&reply_tx, "invalid_message", "malformed event envelope");
                            continue;
                        }
                    };

                    // 退室はループの終了を伴うため dispatch の外で扱う
                    if matches!(event, ClientEvent::LeaveRoom) {
                        handle_leave(&state_clone, &room_id_clone, &player_id_clone).await;
                        break;
                    }

                    if let Err(error) =
                        dispatch(&state_clone, &room_id_clone, &player_id_clone, event).await
                    {
                        let message = match &error {
                            LobbyError::Internal(_) => "internal error".to_string(),
                            other => other.to_string(),
                        };
                        reply_error(&reply_tx, error.code(), &message);
                    }
                }
                Message::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Player '{}' requested close", player_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push room events to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // ソケットのクローズ（正常・異常とも）は必ず切断経路を通す
    run_disconnect(&state, &room_id, &player_id, Some(&connection_id)).await;
}

/// リクエスト単位の失敗を起こした本人にだけ返す
fn reply_error(reply_tx: &PusherChannel, code: &str, message: &str) {
    let event = ServerEvent::Error {
        code: code.to_string(),
        message: message.to_string(),
    };
    let json = serde_json::to_string(&event).unwrap();
    if reply_tx.send(json).is_err() {
        tracing::debug!("Dropping error reply: connection already closed");
    }
}

/// Decode one client event into the matching use case call.
async fn dispatch(
    state: &Arc<AppState>,
    room_id: &RoomId,
    player_id: &PlayerId,
    event: ClientEvent,
) -> Result<(), LobbyError> {
    match event {
        ClientEvent::SendMessage {
            content,
            target_player_id,
        } => {
            let target = target_player_id.map(PlayerId::new).transpose()?;
            let message = state
                .send_message_usecase
                .execute(room_id, player_id, content, target)
                .await?;
            let json = serde_json::to_string(&ServerEvent::from(&message)).unwrap();
            state.send_message_usecase.deliver(&message, &json).await;
        }
        ClientEvent::UpdatePing { ping_ms } => {
            let ping = state
                .update_ping_usecase
                .execute(room_id, player_id, ping_ms)
                .await?;
            let event = ServerEvent::PingUpdated {
                player_id: player_id.as_str().to_string(),
                ping_ms: ping.value(),
            };
            let json = serde_json::to_string(&event).unwrap();
            state
                .update_ping_usecase
                .broadcast_ping_updated(room_id, player_id, &json)
                .await;
        }
        ClientEvent::PlayerReady { is_ready } => {
            let change = state
                .set_ready_usecase
                .execute(room_id, player_id, is_ready)
                .await?;
            let event = ServerEvent::PlayerReadyChanged {
                player_id: change.player_id.as_str().to_string(),
                is_ready: change.is_ready,
            };
            let json = serde_json::to_string(&event).unwrap();
            state
                .set_ready_usecase
                .broadcast_ready_changed(room_id, &json)
                .await;

            if change.all_ready_and_minimum_met {
                let json = serde_json::to_string(&ServerEvent::AllPlayersReady).unwrap();
                state
                    .set_ready_usecase
                    .broadcast_all_players_ready(room_id, &json)
                    .await;
            }
        }
        ClientEvent::StartGame => {
            let outcome = state.start_game_usecase.execute(room_id, player_id).await?;
            let event = ServerEvent::GameStarted {
                phase: outcome.phase.as_str().to_string(),
                players: outcome.players.iter().map(PlayerDto::from).collect(),
            };
            let json = serde_json::to_string(&event).unwrap();
            state
                .start_game_usecase
                .broadcast_game_started(room_id, &json)
                .await;
        }
        ClientEvent::KickPlayer { target_player_id } => {
            let target = PlayerId::new(target_player_id)?;
            let outcome = state
                .kick_player_usecase
                .execute(room_id, player_id, &target)
                .await?;

            // 本人への通知は購読を解除する前に送る
            let kicked_json = serde_json::to_string(&ServerEvent::Kicked).unwrap();
            state.kick_player_usecase.notify_kicked(&target, &kicked_json).await;
            state.kick_player_usecase.detach_target(&target).await;

            let event = ServerEvent::PlayerKicked {
                player_id: outcome.player.id.as_str().to_string(),
                player_name: outcome.player.name.as_str().to_string(),
            };
            let json = serde_json::to_string(&event).unwrap();
            state
                .kick_player_usecase
                .broadcast_player_kicked(room_id, &json)
                .await;
        }
        ClientEvent::Heartbeat => {
            if let Err(e) = state.presence_tracker.refresh(player_id).await {
                tracing::warn!("Failed to refresh presence for '{}': {}", player_id, e);
            }
        }
        // handled by the caller
        ClientEvent::LeaveRoom => {}
    }
    Ok(())
}

/// 自発的な退室（ハード削除）と残りのメンバーへの通知
async fn handle_leave(state: &Arc<AppState>, room_id: &RoomId, player_id: &PlayerId) {
    match state.leave_room_usecase.execute(room_id, player_id).await {
        Ok(Some(outcome)) => {
            let event = ServerEvent::PlayerDisconnected {
                player_id: outcome.player.id.as_str().to_string(),
                player_name: outcome.player.name.as_str().to_string(),
                new_host_id: outcome.new_host_id.map(|id| id.as_str().to_string()),
            };
            let json = serde_json::to_string(&event).unwrap();
            state
                .leave_room_usecase
                .broadcast_player_left(room_id, &json)
                .await;
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("Failed to process leave for '{}': {}", player_id, e),
    }
}

/// ソケットクローズと sweeper が共有する切断経路
///
/// `connection_id` が `Some` のときは、その接続が現在の紐付けである
/// 場合にのみ切断します（再接続で置き換えられたクローズは no-op）。
pub(crate) async fn run_disconnect(
    state: &Arc<AppState>,
    room_id: &RoomId,
    player_id: &PlayerId,
    connection_id: Option<&ConnectionId>,
) {
    match state
        .disconnect_player_usecase
        .execute(room_id, player_id, connection_id)
        .await
    {
        Ok(Some(outcome)) => {
            let event = ServerEvent::PlayerDisconnected {
                player_id: outcome.player.id.as_str().to_string(),
                player_name: outcome.player.name.as_str().to_string(),
                new_host_id: outcome.new_host_id.map(|id| id.as_str().to_string()),
            };
            let json = serde_json::to_string(&event).unwrap();
            state
                .disconnect_player_usecase
                .broadcast_player_disconnected(room_id, &json)
                .await;
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("Failed to disconnect player '{}': {}", player_id, e),
    }
}
