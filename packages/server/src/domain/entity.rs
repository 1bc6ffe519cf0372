//! ドメインエンティティ定義
//!
//! Room / Player / ChatMessage と、ルーム内の不変条件を守る操作を提供します。
//! ここは純粋なデータとロジックのみで、I/O・ロック・ブロードキャストは
//! 持ちません（Repository が per-room ロックの内側から呼び出します）。
//!
//! ## 守っている不変条件
//!
//! - ホストフラグは常にちょうど 1 人（アクティブな参加者がいる限り）
//! - アクティブなプレイヤー名はルーム内で一意（大文字小文字を区別）
//! - アクティブ人数は定員（max_players）を超えない
//! - `Lobby -> Started` の遷移は一度きり。開始後の join / kick / ready は拒否

use rand::Rng;
use rand::seq::SliceRandom;

use super::error::LobbyError;
use super::value_object::{
    COUNTRY_POOL, GamePhase, Language, MessageContent, PlayerId, PlayerName, PlayerStatus, PingMs,
    RoomId, Timestamp,
};

/// ルーム定員の下限
pub const MIN_PLAYERS: u8 = 4;

/// ルーム定員の上限
pub const MAX_PLAYERS: u8 = 10;

/// 開始条件に必要な最少アクティブ人数
pub const MIN_PLAYERS_TO_START: usize = 4;

/// ルーム作成時の設定（検証済み）
#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub name: String,
    pub password: Option<String>,
    pub language: Language,
    pub max_players: u8,
}

impl RoomConfig {
    /// 検証付きで RoomConfig を生成
    ///
    /// 名前が空、または定員が 4..=10 の範囲外なら `InvalidConfig`。
    pub fn new(
        name: String,
        password: Option<String>,
        language: Language,
        max_players: u8,
    ) -> Result<Self, LobbyError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(LobbyError::InvalidConfig("room name is empty".to_string()));
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&max_players) {
            return Err(LobbyError::InvalidConfig(format!(
                "max_players must be between {} and {}",
                MIN_PLAYERS, MAX_PLAYERS
            )));
        }
        // 空文字列のパスワードは「パスワードなし」と同義
        let password = password.filter(|p| !p.is_empty());
        Ok(Self {
            name: trimmed.to_string(),
            password,
            language,
            max_players,
        })
    }
}

/// ルーム内の参加者
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: PlayerName,
    pub is_host: bool,
    pub is_ready: bool,
    pub status: PlayerStatus,
    pub ping: Option<PingMs>,
    pub country: Option<String>,
    pub country_flag: Option<String>,
    /// ゲーム本体が使う持ち越し状態。ロビーでは変更しない
    pub attack_troops: u32,
    pub defense_troops: u32,
    pub joined_at: Timestamp,
}

impl Player {
    fn new(name: PlayerName, is_host: bool, joined_at: Timestamp) -> Self {
        Self {
            id: PlayerId::generate(),
            name,
            is_host,
            is_ready: false,
            status: PlayerStatus::Active,
            ping: None,
            country: None,
            country_flag: None,
            attack_troops: 0,
            defense_troops: 0,
            joined_at,
        }
    }
}

/// join の結果（新規参加か、切断中レコードへの復帰か）
#[derive(Debug, Clone)]
pub enum JoinOutcome {
    /// 新しいプレイヤーとして追加された
    Joined(Player),
    /// 切断中だった同名レコードに再バインドされた
    Resumed(Player),
}

impl JoinOutcome {
    pub fn player(&self) -> &Player {
        match self {
            Self::Joined(p) | Self::Resumed(p) => p,
        }
    }
}

/// プレイヤーがロスターから外れた（または切断された）結果
///
/// ホストが外れた場合は再割り当て先を持ち、呼び出し元が
/// 同一イベントの一部としてブロードキャストできるようにします。
#[derive(Debug, Clone)]
pub struct RemovalOutcome {
    pub player: Player,
    pub new_host_id: Option<PlayerId>,
}

/// ready 変更の結果
///
/// 開始条件の判定はロスター変更と同一クリティカルセクションで
/// 評価する必要があるため、結果に含めて返します。
#[derive(Debug, Clone)]
pub struct ReadyChange {
    pub player_id: PlayerId,
    pub is_ready: bool,
    pub all_ready_and_minimum_met: bool,
}

/// ゲーム開始の結果（国割り当て済みの最終ロスター）
#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub phase: GamePhase,
    pub players: Vec<Player>,
}

/// ロビー 1 室
///
/// `players` は参加順を保持します。UI の決定的な表示順と、
/// 国割り当て時の zip 順の両方がこの順序に依存します。
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    password: Option<String>,
    pub language: Language,
    pub max_players: u8,
    pub phase: GamePhase,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub players: Vec<Player>,
}

impl Room {
    /// 新しいルームを作成し、作成者を唯一のホストとして追加
    pub fn new(id: RoomId, config: RoomConfig, host_name: PlayerName, now: Timestamp) -> Self {
        let host = Player::new(host_name, true, now);
        Self {
            id,
            name: config.name,
            password: config.password,
            language: config.language,
            max_players: config.max_players,
            phase: GamePhase::Lobby,
            created_at: now,
            started_at: None,
            players: vec![host],
        }
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// パスワード検証（設定されていなければ常に成功）
    pub fn verify_password(&self, given: Option<&str>) -> Result<(), LobbyError> {
        match &self.password {
            None => Ok(()),
            Some(expected) if given == Some(expected.as_str()) => Ok(()),
            Some(_) => Err(LobbyError::WrongPassword),
        }
    }

    /// アクティブ（disconnected 以外）なプレイヤー
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.status.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active_players().count()
    }

    pub fn find_player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == player_id)
    }

    /// 現在のホスト
    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    fn ensure_lobby(&self) -> Result<(), LobbyError> {
        match self.phase {
            GamePhase::Lobby => Ok(()),
            GamePhase::Started => Err(LobbyError::RoomStarted),
        }
    }

    /// 開始条件: アクティブ人数が最少人数以上かつ全員 ready
    pub fn all_ready_and_minimum_met(&self) -> bool {
        self.active_count() >= MIN_PLAYERS_TO_START && self.active_players().all(|p| p.is_ready)
    }

    /// プレイヤーを参加させる
    ///
    /// 同名のレコードが `disconnected` なら再バインド（状態を引き継いで復帰）、
    /// アクティブなら `DuplicateName`。どちらの経路でも定員を超えることはありません。
    pub fn join_player(
        &mut self,
        name: PlayerName,
        now: Timestamp,
    ) -> Result<JoinOutcome, LobbyError> {
        self.ensure_lobby()?;

        if let Some(idx) = self.players.iter().position(|p| p.name == name) {
            if self.players[idx].status == PlayerStatus::Disconnected {
                if self.active_count() >= self.max_players as usize {
                    return Err(LobbyError::CapacityExceeded);
                }
                let player = &mut self.players[idx];
                player.status = PlayerStatus::Active;
                player.is_ready = false;
                return Ok(JoinOutcome::Resumed(player.clone()));
            }
            return Err(LobbyError::DuplicateName);
        }

        if self.active_count() >= self.max_players as usize {
            return Err(LobbyError::CapacityExceeded);
        }

        let player = Player::new(name, false, now);
        self.players.push(player.clone());
        Ok(JoinOutcome::Joined(player))
    }

    /// プレイヤーをロスターから完全に削除（kick / 自発的な退室）
    ///
    /// 冪等: 不在なら None。削除されたのがホストなら再割り当てします。
    pub fn remove_player(&mut self, player_id: &PlayerId) -> Option<RemovalOutcome> {
        let idx = self.players.iter().position(|p| &p.id == player_id)?;
        let player = self.players.remove(idx);
        let new_host_id = if player.is_host {
            self.reassign_host()
        } else {
            None
        };
        Some(RemovalOutcome {
            player,
            new_host_id,
        })
    }

    /// プレイヤーを切断扱いにする（レコードは残す）
    ///
    /// 冪等: 不在または既に切断済みなら None。再参加（同名での復帰）に
    /// 備えてレコードを保持し、枠だけを解放します。
    pub fn disconnect_player(&mut self, player_id: &PlayerId) -> Option<RemovalOutcome> {
        let idx = self.players.iter().position(|p| &p.id == player_id)?;
        if self.players[idx].status == PlayerStatus::Disconnected {
            return None;
        }

        let was_host = self.players[idx].is_host;
        {
            let player = &mut self.players[idx];
            player.status = PlayerStatus::Disconnected;
            player.is_ready = false;
            player.is_host = false;
            player.ping = None;
        }
        let snapshot = self.players[idx].clone();
        let new_host_id = if was_host { self.reassign_host() } else { None };
        Some(RemovalOutcome {
            player: snapshot,
            new_host_id,
        })
    }

    /// 最も早く参加したアクティブなプレイヤーをホストに昇格
    ///
    /// `players` が参加順を保持しているため、先頭から走査するだけで
    /// 「最古の生存者」規則になります。
    fn reassign_host(&mut self) -> Option<PlayerId> {
        let next = self.players.iter_mut().find(|p| p.status.is_active())?;
        next.is_host = true;
        Some(next.id.clone())
    }

    /// ready フラグを設定
    ///
    /// 既に同じ値でも変更として報告します（クライアント側の冪等な同期のため）。
    pub fn set_ready(
        &mut self,
        player_id: &PlayerId,
        is_ready: bool,
    ) -> Result<ReadyChange, LobbyError> {
        self.ensure_lobby()?;
        let player = self
            .players
            .iter_mut()
            .find(|p| &p.id == player_id && p.status.is_active())
            .ok_or(LobbyError::NotFound)?;
        player.is_ready = is_ready;
        let player_id = player.id.clone();
        Ok(ReadyChange {
            player_id,
            is_ready,
            all_ready_and_minimum_met: self.all_ready_and_minimum_met(),
        })
    }

    /// 接続状態を設定（存在するプレイヤーに対しては常に成功）
    pub fn set_connectivity(
        &mut self,
        player_id: &PlayerId,
        status: PlayerStatus,
    ) -> Result<(), LobbyError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| &p.id == player_id)
            .ok_or(LobbyError::NotFound)?;
        player.status = status;
        Ok(())
    }

    /// ping を更新（値は呼び出し前にクランプ済み）
    pub fn update_ping(&mut self, player_id: &PlayerId, ping: PingMs) -> Result<(), LobbyError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| &p.id == player_id)
            .ok_or(LobbyError::NotFound)?;
        player.ping = Some(ping);
        Ok(())
    }

    /// プレイヤーをキックする（ホスト専用）
    pub fn kick(
        &mut self,
        acting: &PlayerId,
        target: &PlayerId,
    ) -> Result<RemovalOutcome, LobbyError> {
        self.ensure_lobby()?;
        let actor = self.find_player(acting).ok_or(LobbyError::NotFound)?;
        if !actor.is_host {
            return Err(LobbyError::Forbidden);
        }
        if acting == target {
            return Err(LobbyError::CannotKickSelf);
        }
        self.remove_player(target).ok_or(LobbyError::NotFound)
    }

    /// `Lobby -> Started` の遷移（一度きり）
    ///
    /// 開始条件を満たしたうえで国プールをシャッフルし、参加順のまま
    /// アクティブなプレイヤーに割り当てます。readiness は次フェーズの
    /// 準備確認に使うためリセットします。
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        acting: &PlayerId,
        rng: &mut R,
        now: Timestamp,
    ) -> Result<StartOutcome, LobbyError> {
        let actor = self.find_player(acting).ok_or(LobbyError::NotFound)?;
        if !actor.is_host {
            return Err(LobbyError::Forbidden);
        }
        self.ensure_lobby()?;
        if !self.all_ready_and_minimum_met() {
            return Err(LobbyError::NotReady);
        }
        if self.active_count() > COUNTRY_POOL.len() {
            // 定員制約上ここには来ないはずだが、プール側の縮小に備えて検査する
            return Err(LobbyError::InsufficientCountries);
        }

        let mut pool: Vec<_> = COUNTRY_POOL.to_vec();
        pool.shuffle(rng);

        let mut assigned = pool.into_iter();
        for player in self
            .players
            .iter_mut()
            .filter(|p| p.status.is_active())
        {
            // active_count <= pool 長を検査済みのため必ず値がある
            if let Some(country) = assigned.next() {
                player.country = Some(country.name.to_string());
                player.country_flag = Some(country.flag.to_string());
            }
            player.is_ready = false;
        }

        self.phase = GamePhase::Started;
        self.started_at = Some(now);

        Ok(StartOutcome {
            phase: self.phase,
            players: self.active_players().cloned().collect(),
        })
    }
}

/// チャットメッセージ（ファンアウトの間だけ存在する短命データ）
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub room_id: RoomId,
    pub sender_id: PlayerId,
    pub sender_name: PlayerName,
    pub content: MessageContent,
    pub target_player_id: Option<PlayerId>,
    pub created_at: Timestamp,
}

impl ChatMessage {
    pub fn new(
        room_id: RoomId,
        sender_id: PlayerId,
        sender_name: PlayerName,
        content: MessageContent,
        target_player_id: Option<PlayerId>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            room_id,
            sender_id,
            sender_name,
            content,
            target_player_id,
            created_at,
        }
    }

    /// 宛先指定があればプライベートメッセージ
    pub fn is_private(&self) -> bool {
        self.target_player_id.is_some()
    }
}
