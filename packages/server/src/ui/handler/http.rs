//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use genkan_shared::time::timestamp_to_utc_rfc3339;

use crate::domain::{Language, LobbyError, PlayerId, PlayerName, RoomConfig, RoomId};
use crate::infrastructure::dto::http::{
    CreateRoomRequest, CreateRoomResponse, ErrorResponse, JoinRoomRequest, JoinRoomResponse,
    RoomDetailDto, RoomSummaryDto,
};
use crate::infrastructure::dto::websocket::{PlayerDto, RoomStateDto, ServerEvent};
use crate::ui::state::AppState;

type HttpError = (StatusCode, Json<ErrorResponse>);

/// LobbyError を HTTP レスポンスに対応付ける
///
/// 内部エラーは詳細を漏らさず一般化して返します（ログには残る）。
fn error_response(error: LobbyError) -> HttpError {
    let status = match &error {
        LobbyError::NotFound => StatusCode::NOT_FOUND,
        LobbyError::Forbidden | LobbyError::CannotKickSelf => StatusCode::FORBIDDEN,
        LobbyError::WrongPassword => StatusCode::UNAUTHORIZED,
        LobbyError::DuplicateName
        | LobbyError::CapacityExceeded
        | LobbyError::RoomStarted
        | LobbyError::NotReady => StatusCode::CONFLICT,
        LobbyError::InvalidMessage | LobbyError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        LobbyError::InsufficientCountries => StatusCode::INTERNAL_SERVER_ERROR,
        LobbyError::Internal(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let message = match &error {
        LobbyError::Internal(_) => "internal error".to_string(),
        other => other.to_string(),
    };
    (
        status,
        Json(ErrorResponse {
            code: error.code().to_string(),
            message,
        }),
    )
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// List joinable (lobby-phase) rooms
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.list_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    let summaries: Vec<RoomSummaryDto> = rooms.iter().map(RoomSummaryDto::from).collect();
    Json(summaries)
}

/// Create a new room with the caller as its host
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), HttpError> {
    let language = match request.language.as_deref() {
        None => Language::default(),
        Some(raw) => Language::parse(raw).ok_or_else(|| {
            error_response(LobbyError::InvalidConfig(format!(
                "unsupported language: {}",
                raw
            )))
        })?,
    };
    let host_name = PlayerName::new(request.host_name).map_err(error_response)?;
    let config = RoomConfig::new(request.name, request.password, language, request.max_players)
        .map_err(error_response)?;

    let room = state
        .create_room_usecase
        .execute(config, host_name)
        .await
        .map_err(error_response)?;

    let response = CreateRoomResponse {
        player: PlayerDto::from(&room.players[0]),
        room: RoomStateDto::from(&room),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Query parameters for the room detail endpoint
#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub player_id: String,
}

/// Get room detail by ID (members only)
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<RoomDetailDto>, HttpError> {
    let room_id = RoomId::new(room_id).map_err(error_response)?;
    let player_id = PlayerId::new(query.player_id).map_err(error_response)?;

    let room = state
        .get_room_detail_usecase
        .execute(&room_id, &player_id)
        .await
        .map_err(error_response)?;

    let detail = RoomDetailDto {
        created_at_rfc3339: timestamp_to_utc_rfc3339(room.created_at.value()),
        room: RoomStateDto::from(&room),
    };
    Ok(Json(detail))
}

/// Join a room
///
/// 参加者はレスポンスの authoritative なスナップショットで現在の
/// ロスターを知り、既存メンバーは `player_joined` ブロードキャストで
/// 参加者を知ります。この分離が「既存メンバーが新規参加者を知らない」
/// クラスのバグを防ぎます。
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, HttpError> {
    let room_id = RoomId::new(room_id).map_err(error_response)?;
    let player_name = PlayerName::new(request.player_name).map_err(error_response)?;

    let (outcome, room) = state
        .join_room_usecase
        .execute(&room_id, player_name, request.password)
        .await
        .map_err(error_response)?;

    let player = PlayerDto::from(outcome.player());
    let event = ServerEvent::PlayerJoined {
        player: player.clone(),
    };
    let event_json = serde_json::to_string(&event).unwrap();
    state
        .join_room_usecase
        .broadcast_player_joined(&room_id, &outcome.player().id, &event_json)
        .await;

    Ok(Json(JoinRoomResponse {
        room: RoomStateDto::from(&room),
        player,
    }))
}
