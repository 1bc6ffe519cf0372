//! ドメイン層の値オブジェクト定義
//!
//! 生の文字列や数値を直接持ち回らず、検証済みの型として扱います。
//! 変換は境界（UI 層・DTO 層）で一度だけ行います。

use rand::Rng;

use super::error::LobbyError;

/// ルーム ID の文字数（短く、手入力できる長さ）
pub const ROOM_ID_LEN: usize = 6;

/// ルーム ID に使用する文字集合
const ROOM_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// プレイヤー名の最大文字数
pub const MAX_PLAYER_NAME_LEN: usize = 32;

/// チャットメッセージ本文の最大文字数
pub const MAX_MESSAGE_LEN: usize = 500;

/// ping の上限値（ミリ秒）。範囲外は拒否せずクランプする
pub const MAX_PING_MS: u32 = 60_000;

/// ルーム ID（固定長・大文字英数字）
///
/// 外部に公開される識別子。長い不透明トークンではなく、
/// 人間が読み上げて入力できる短い形式を保証します。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// 検証付きで RoomId を生成
    pub fn new(value: String) -> Result<Self, LobbyError> {
        if value.len() != ROOM_ID_LEN
            || !value
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(LobbyError::NotFound);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// RoomId の採番
///
/// 衝突チェックはレジストリ側（Repository）が行い、使用中なら再生成します。
pub struct RoomIdFactory;

impl RoomIdFactory {
    /// ランダムな RoomId を生成
    pub fn generate() -> RoomId {
        let mut rng = rand::rng();
        let id: String = (0..ROOM_ID_LEN)
            .map(|_| {
                let idx = rng.random_range(0..ROOM_ID_CHARSET.len());
                ROOM_ID_CHARSET[idx] as char
            })
            .collect();
        RoomId(id)
    }
}

/// プレイヤー ID（UUID v4）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerId(String);

impl PlayerId {
    /// 新しい PlayerId を採番
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// 外部から受け取った ID をそのまま保持
    ///
    /// 実在チェックは Roster 側で行うため、ここでは形式検証のみ（空を拒否）。
    pub fn new(value: String) -> Result<Self, LobbyError> {
        if value.trim().is_empty() {
            return Err(LobbyError::NotFound);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 接続 ID（1 本の WebSocket 接続を識別する）
///
/// 同一プレイヤーの再接続で古い接続を置き換える（supersede）判定に使います。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// プレイヤー表示名（ルーム内で一意、大文字小文字を区別）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerName(String);

impl PlayerName {
    /// 検証付きで PlayerName を生成（前後の空白は除去）
    pub fn new(value: String) -> Result<Self, LobbyError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LobbyError::InvalidConfig("player name is empty".to_string()));
        }
        if trimmed.chars().count() > MAX_PLAYER_NAME_LEN {
            return Err(LobbyError::InvalidConfig(format!(
                "player name exceeds {} characters",
                MAX_PLAYER_NAME_LEN
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// チャットメッセージ本文（空・長すぎる本文は `InvalidMessage`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, LobbyError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_MESSAGE_LEN {
            return Err(LobbyError::InvalidMessage);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Unix タイムスタンプ（UTC、ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// 計測された往復遅延（ミリ秒）
///
/// クライアント申告値のため、範囲外は拒否せず 0..=MAX_PING_MS にクランプします。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingMs(u32);

impl PingMs {
    /// クランプ付きで PingMs を生成
    pub fn from_unclamped(value: i64) -> Self {
        Self(value.clamp(0, MAX_PING_MS as i64) as u32)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// ルームの表示言語
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ru => "ru",
            Self::En => "en",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ru" => Some(Self::Ru),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

/// ルームのフェーズ
///
/// `Lobby -> Started` の遷移は一度きりで、逆方向はありません。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Lobby,
    Started,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Started => "started",
        }
    }
}

/// プレイヤーの接続状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Active,
    Observer,
    Disconnected,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Observer => "observer",
            Self::Disconnected => "disconnected",
        }
    }

    /// 定員・開始条件にカウントされるか（disconnected 以外）
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "observer" => Some(Self::Observer),
            "disconnected" => Some(Self::Disconnected),
            _ => None,
        }
    }
}

/// 割り当て可能な国の定義（名前 + 国旗絵文字）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryDef {
    pub name: &'static str,
    pub flag: &'static str,
}

/// 国プール
///
/// サイズはサポートする最大定員（10）以上を維持すること。
pub const COUNTRY_POOL: [CountryDef; 10] = [
    CountryDef { name: "Russia", flag: "🇷🇺" },
    CountryDef { name: "USA", flag: "🇺🇸" },
    CountryDef { name: "China", flag: "🇨🇳" },
    CountryDef { name: "Germany", flag: "🇩🇪" },
    CountryDef { name: "France", flag: "🇫🇷" },
    CountryDef { name: "United Kingdom", flag: "🇬🇧" },
    CountryDef { name: "Japan", flag: "🇯🇵" },
    CountryDef { name: "Italy", flag: "🇮🇹" },
    CountryDef { name: "Spain", flag: "🇪🇸" },
    CountryDef { name: "Canada", flag: "🇨🇦" },
];
