//! Value Objects
//!
//! ロビーのドメインで使う不変の値。生成時にバリデーションを行い、
//! 以降は常に妥当な値であることを型で保証する。

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error(
        "Room code must be {min}-{max} characters from [A-Z0-9], got '{0}'",
        min = RoomCode::MIN_LEN,
        max = RoomCode::MAX_LEN
    )]
    InvalidRoomCode(String),

    #[error("Player ID must not be empty")]
    EmptyPlayerId,

    #[error("Player ID is too long ({0} > {max})", max = PlayerId::MAX_LEN)]
    PlayerIdTooLong(usize),

    #[error("Display name must not be empty")]
    EmptyDisplayName,

    #[error("Unknown game mode '{0}'")]
    UnknownGameMode(String),

    #[error("Unknown slot address '{0}' (expected team1.slot1 .. team2.slot2)")]
    UnknownSlotAddress(String),
}

// ========================================
// RoomCode
// ========================================

/// Short, human-shareable lobby identifier.
///
/// Codes are case-insensitive on input and always stored upper-case, so a
/// code read aloud or typed on a phone keyboard resolves to the same lobby.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomCode(String);

impl RoomCode {
    pub const MIN_LEN: usize = 4;
    pub const MAX_LEN: usize = 12;

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let normalized = value.trim().to_ascii_uppercase();
        let valid_len = (Self::MIN_LEN..=Self::MAX_LEN).contains(&normalized.len());
        if !valid_len || !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValueObjectError::InvalidRoomCode(value));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// RoomCode の生成器
pub struct RoomCodeFactory;

impl RoomCodeFactory {
    /// Generated code length
    pub const LENGTH: usize = 6;

    /// Alphabet without the look-alike characters 0/O and 1/I.
    ///
    /// 32 symbols, so `byte % 32` stays uniform.
    const ALPHABET: &'static [u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    /// Generate a random room code from a v4 UUID's random bytes
    pub fn generate() -> RoomCode {
        let uuid = uuid::Uuid::new_v4();
        let code: String = uuid
            .as_bytes()
            .iter()
            .take(Self::LENGTH)
            .map(|byte| Self::ALPHABET[usize::from(*byte) % Self::ALPHABET.len()] as char)
            .collect();
        RoomCode(code)
    }
}

// ========================================
// PlayerId
// ========================================

/// Identity of a player as supplied by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(String);

impl PlayerId {
    pub const MAX_LEN: usize = 128;

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyPlayerId);
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(ValueObjectError::PlayerIdTooLong(trimmed.len()));
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

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PlayerId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ========================================
// Timestamp
// ========================================

/// Unix timestamp in milliseconds (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed from `self` to `later` (negative if `later` is earlier)
    pub fn millis_until(&self, later: Timestamp) -> i64 {
        later.0.saturating_sub(self.0)
    }
}

// ========================================
// GameMode
// ========================================

/// Game format, fixed when the lobby is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    Singles,
    Doubles,
}

impl GameMode {
    /// Slots in play for this mode, in canonical fill order
    pub fn slots(&self) -> &'static [SlotAddress] {
        const SINGLES: [SlotAddress; 2] = [SlotAddress::TEAM1_SLOT1, SlotAddress::TEAM2_SLOT1];
        match self {
            GameMode::Singles => &SINGLES,
            GameMode::Doubles => &SlotAddress::CANONICAL_ORDER,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots().len()
    }

    pub fn uses(&self, address: SlotAddress) -> bool {
        self.slots().contains(&address)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Singles => "SINGLES",
            GameMode::Doubles => "DOUBLES",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SINGLES" => Ok(GameMode::Singles),
            "DOUBLES" => Ok(GameMode::Doubles),
            _ => Err(ValueObjectError::UnknownGameMode(s.to_string())),
        }
    }
}

// ========================================
// SlotAddress
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TeamSide {
    Team1,
    Team2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    Slot1,
    Slot2,
}

/// `(team, position)` address of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotAddress {
    pub team: TeamSide,
    pub position: Position,
}

impl SlotAddress {
    pub const TEAM1_SLOT1: Self = Self::new(TeamSide::Team1, Position::Slot1);
    pub const TEAM1_SLOT2: Self = Self::new(TeamSide::Team1, Position::Slot2);
    pub const TEAM2_SLOT1: Self = Self::new(TeamSide::Team2, Position::Slot1);
    pub const TEAM2_SLOT2: Self = Self::new(TeamSide::Team2, Position::Slot2);

    /// Fill order used by auto-join. Every client must scan in this order
    /// so concurrent joiners converge on the same first-empty slot.
    pub const CANONICAL_ORDER: [Self; 4] = [
        Self::TEAM1_SLOT1,
        Self::TEAM1_SLOT2,
        Self::TEAM2_SLOT1,
        Self::TEAM2_SLOT2,
    ];

    pub const fn new(team: TeamSide, position: Position) -> Self {
        Self { team, position }
    }

    pub fn team_key(&self) -> &'static str {
        match self.team {
            TeamSide::Team1 => "team1",
            TeamSide::Team2 => "team2",
        }
    }

    pub fn slot_key(&self) -> &'static str {
        match self.position {
            Position::Slot1 => "slot1",
            Position::Slot2 => "slot2",
        }
    }
}

impl fmt::Display for SlotAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.team_key(), self.slot_key())
    }
}

impl FromStr for SlotAddress {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CANONICAL_ORDER
            .into_iter()
            .find(|address| address.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValueObjectError::UnknownSlotAddress(s.to_string()))
    }
}
