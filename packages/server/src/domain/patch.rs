//! Typed lobby mutations.
//!
//! A `LobbyPatch` is what the coordinator sends to the store: the field
//! changes to make and the guards (preconditions) that must still hold for
//! the decision that produced them to be valid. The store schema encoding
//! lives in `infrastructure::dto`.

use super::{
    entity::{FinalScore, LifecycleState, Lobby, PlayerSnapshot},
    value_object::{RoomCode, SlotAddress, Timestamp},
};

/// One field-level change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyChange {
    Slot(SlotAddress, Option<PlayerSnapshot>),
    WaitingPlayers(Vec<PlayerSnapshot>),
    /// Lifecycle state together with the countdown and listing flags
    State(LifecycleState),
    LastActivityAt(Timestamp),
    StartedAt(Timestamp),
    CompletedAt(Timestamp),
    CancelReason(Option<String>),
    FinalScore(FinalScore),
    RematchCode(RoomCode),
}

impl LobbyChange {
    /// Housekeeping fields may be overwritten by anyone at any time and are
    /// never used to judge whether a write landed.
    pub fn is_housekeeping(&self) -> bool {
        matches!(self, LobbyChange::LastActivityAt(_))
    }
}

/// Precondition on the decision-relevant part of the lobby
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyGuard {
    /// Slot holds exactly this occupant (`None` = empty)
    SlotHolds(SlotAddress, Option<PlayerSnapshot>),
    SlotOccupied(SlotAddress),
    WaitingPlayersAre(Vec<PlayerSnapshot>),
    StateIs(LifecycleState),
}

impl LobbyGuard {
    pub fn holds(&self, lobby: &Lobby) -> bool {
        match self {
            LobbyGuard::SlotHolds(address, occupant) => lobby.slot(*address) == occupant.as_ref(),
            LobbyGuard::SlotOccupied(address) => lobby.slot(*address).is_some(),
            LobbyGuard::WaitingPlayersAre(players) => &lobby.waiting_players == players,
            LobbyGuard::StateIs(state) => &lobby.state == state,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LobbyPatch {
    pub changes: Vec<LobbyChange>,
    pub guards: Vec<LobbyGuard>,
}

impl LobbyPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn change(mut self, change: LobbyChange) -> Self {
        self.changes.push(change);
        self
    }

    pub fn guard(mut self, guard: LobbyGuard) -> Self {
        self.guards.push(guard);
        self
    }

    /// Stamp `lastActivityAt`
    pub fn touched_at(self, now: Timestamp) -> Self {
        self.change(LobbyChange::LastActivityAt(now))
    }

    pub fn guards_hold(&self, lobby: &Lobby) -> bool {
        self.guards.iter().all(|guard| guard.holds(lobby))
    }

    /// Whether every non-housekeeping change is reflected in `lobby`.
    ///
    /// Used after an unconditional write to tell whether a concurrent
    /// writer overwrote us before we re-read.
    pub fn landed_in(&self, lobby: &Lobby) -> bool {
        let decisive = LobbyPatch {
            changes: self
                .changes
                .iter()
                .filter(|change| !change.is_housekeeping())
                .cloned()
                .collect(),
            guards: Vec::new(),
        };
        decisive.apply(lobby) == *lobby
    }

    /// Project the patch onto a local copy of the lobby
    pub fn apply(&self, lobby: &Lobby) -> Lobby {
        let mut next = lobby.clone();
        for change in &self.changes {
            match change {
                LobbyChange::Slot(address, occupant) => *next.slot_mut(*address) = occupant.clone(),
                LobbyChange::WaitingPlayers(players) => next.waiting_players = players.clone(),
                LobbyChange::State(state) => next.state = *state,
                LobbyChange::LastActivityAt(at) => next.last_activity_at = *at,
                LobbyChange::StartedAt(at) => next.started_at = Some(*at),
                LobbyChange::CompletedAt(at) => next.completed_at = Some(*at),
                LobbyChange::CancelReason(reason) => next.cancel_reason = reason.clone(),
                LobbyChange::FinalScore(score) => next.final_score = Some(*score),
                LobbyChange::RematchCode(code) => next.rematch_code = Some(code.clone()),
            }
        }
        next
    }
}
