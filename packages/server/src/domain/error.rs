//! ドメイン層のエラー定義
//!
//! ロビー操作の失敗は全てリクエスト単位で呼び出し元に返されます。
//! 他の参加者には影響せず、Roster の部分的な変更も残しません（§ エラー方針）。

use thiserror::Error;

/// ロビー操作のエラー分類
///
/// 各バリアントは安定したワイヤーコード（snake_case）を持ち、
/// WebSocket の `error` イベントおよび HTTP レスポンスで使用されます。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    /// ルームまたはプレイヤーが存在しない
    #[error("room or player not found")]
    NotFound,
    /// ホスト専用の操作を非ホストが実行した
    #[error("only the host can perform this action")]
    Forbidden,
    /// 同名のアクティブなプレイヤーが既にルームにいる
    #[error("a player with this name is already in the room")]
    DuplicateName,
    /// ルームの定員超過
    #[error("the room is full")]
    CapacityExceeded,
    /// パスワード不一致
    #[error("wrong password")]
    WrongPassword,
    /// 開始済みのルームへの変更操作
    #[error("the game has already started")]
    RoomStarted,
    /// 開始条件（全員準備完了・最少人数）未達
    #[error("not all players are ready")]
    NotReady,
    /// ホストが自分自身をキックしようとした
    #[error("the host cannot kick themselves")]
    CannotKickSelf,
    /// チャットメッセージが空または長すぎる
    #[error("invalid message body")]
    InvalidMessage,
    /// 国プールがプレイヤー数に足りない（定員制約上、到達しないはず）
    #[error("not enough countries for the roster")]
    InsufficientCountries,
    /// ルーム設定が不正（名前が空、定員が範囲外など）
    #[error("invalid room configuration: {0}")]
    InvalidConfig(String),
    /// 予期しない内部エラー（呼び出し元には一般化して返す）
    #[error("internal error: {0}")]
    Internal(String),
}

impl LobbyError {
    /// ワイヤー上で使う安定したエラーコード
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::DuplicateName => "duplicate_name",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::WrongPassword => "wrong_password",
            Self::RoomStarted => "room_started",
            Self::NotReady => "not_ready",
            Self::CannotKickSelf => "cannot_kick_self",
            Self::InvalidMessage => "invalid_message",
            Self::InsufficientCountries => "insufficient_countries",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Internal(_) => "internal",
        }
    }
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 対象クライアントの接続が登録されていない
    #[error("client '{0}' not found")]
    ClientNotFound(String),
    /// チャンネルへの送信失敗
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// プレゼンスストア（外部の短命 KV）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceError {
    /// ストアが利用できない
    #[error("presence store unavailable: {0}")]
    StoreUnavailable(String),
}
