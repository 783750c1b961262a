//! Lobby document schema as stored in the shared store.
//!
//! ```json
//! {
//!   "roomCode": "K7PQ2M",
//!   "hostId": "alice",
//!   "gameMode": "DOUBLES",
//!   "teams": {
//!     "team1": { "slot1": { "playerId": "alice", "displayName": "Alice", "avatarRef": null }, "slot2": null },
//!     "team2": { "slot1": null, "slot2": null }
//!   },
//!   "waitingPlayers": [],
//!   "lifecycleState": "COUNTDOWN",
//!   "countdown": { "tick": 1 },
//!   "lastActivityAt": 1700000000000,
//!   "createdAt": 1700000000000,
//!   "completed": false,
//!   "cancelled": false
//! }
//! ```
//!
//! `completed` is set for both COMPLETED and CANCELLED lobbies so listings
//! can filter on it; `cancelled` tells the two apart.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ========================================
// Field paths
// ========================================

pub const ROOM_CODE: &str = "roomCode";
pub const HOST_ID: &str = "hostId";
pub const GAME_MODE: &str = "gameMode";
pub const TEAMS: &str = "teams";
pub const WAITING_PLAYERS: &str = "waitingPlayers";
pub const LIFECYCLE_STATE: &str = "lifecycleState";
pub const COUNTDOWN: &str = "countdown";
pub const LAST_ACTIVITY_AT: &str = "lastActivityAt";
pub const STARTED_AT: &str = "startedAt";
pub const COMPLETED_AT: &str = "completedAt";
pub const COMPLETED: &str = "completed";
pub const CANCELLED: &str = "cancelled";
pub const CANCEL_REASON: &str = "cancelReason";
pub const FINAL_SCORE: &str = "finalScore";
pub const REMATCH_CODE: &str = "rematchCode";

// ========================================
// Schema
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyDocument {
    pub room_code: String,
    pub host_id: String,
    pub game_mode: String,
    #[serde(default)]
    pub teams: TeamsDocument,
    #[serde(default)]
    pub waiting_players: Vec<PlayerDocument>,
    pub lifecycle_state: String,
    #[serde(default)]
    pub countdown: Option<CountdownDocument>,
    pub last_activity_at: i64,
    pub created_at: i64,
    #[serde(default)]
    pub started_at: Option<i64>,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub cancel_reason: Option<String>,
    #[serde(default)]
    pub final_score: Option<FinalScoreDocument>,
    #[serde(default)]
    pub rematch_of: Option<String>,
    #[serde(default)]
    pub rematch_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamsDocument {
    #[serde(default)]
    pub team1: TeamDocument,
    #[serde(default)]
    pub team2: TeamDocument,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamDocument {
    #[serde(default)]
    pub slot1: Option<PlayerDocument>,
    #[serde(default)]
    pub slot2: Option<PlayerDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDocument {
    pub player_id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_ref: Option<String>,
}

/// `tick` is `0`, `1` or `"START"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownDocument {
    pub tick: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalScoreDocument {
    pub team1: u32,
    pub team2: u32,
}
