//! HTTP API の DTO 定義

use serde::{Deserialize, Serialize};

use super::websocket::{PlayerDto, RoomStateDto};

/// ルーム作成リクエスト
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    pub max_players: u8,
    pub host_name: String,
}

/// ルーム作成レスポンス（作成者のプレイヤー ID を含む）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room: RoomStateDto,
    pub player: PlayerDto,
}

/// ルーム参加リクエスト
#[derive(Debug, Clone, Deserialize)]
pub struct JoinRoomRequest {
    pub player_name: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// ルーム参加レスポンス
///
/// 参加者はこのスナップショットで現在のロスターを知ります。
/// `player_joined` ブロードキャストは既存メンバーにのみ届きます。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    pub room: RoomStateDto,
    pub player: PlayerDto,
}

/// ルーム一覧の 1 行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub name: String,
    pub host_name: Option<String>,
    pub has_password: bool,
    pub language: String,
    pub max_players: u8,
    pub player_count: usize,
    /// RFC 3339 形式の作成時刻
    pub created_at: String,
}

/// ルーム詳細（メンバーのみ取得できる）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetailDto {
    #[serde(flatten)]
    pub room: RoomStateDto,
    /// RFC 3339 形式の作成時刻
    pub created_at_rfc3339: String,
}

/// リクエスト単位の失敗レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
