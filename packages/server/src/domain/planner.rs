//! Mutation planning.
//!
//! Turns a lobby snapshot plus an intent (join, leave, swap, lifecycle
//! event) into a guarded `LobbyPatch`. Planning is pure: the coordinator
//! re-plans against fresh state whenever a guarded write loses a race.

use super::{
    drag_swap::resolve_swap,
    entity::{LifecycleState, Lobby, PlayerSnapshot},
    error::LobbyError,
    patch::{LobbyChange, LobbyGuard, LobbyPatch},
    slot_assignment::assign_slot,
    state_machine::{self, LifecycleEvent, Transition, TransitionContext},
    value_object::{PlayerId, RoomCode, SlotAddress, Timestamp},
};

/// Result of planning: a write to attempt, or nothing to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan<T> {
    Apply { patch: LobbyPatch, outcome: T },
    Noop(T),
}

impl<T> Plan<T> {
    pub fn outcome(&self) -> &T {
        match self {
            Plan::Apply { outcome, .. } | Plan::Noop(outcome) => outcome,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Seated(SlotAddress),
    AlreadySeated(SlotAddress),
    /// Routed to the waiting list; `position` is 1-based
    Waiting { position: usize },
    AlreadyWaiting { position: usize },
}

impl JoinOutcome {
    pub fn slot(&self) -> Option<SlotAddress> {
        match self {
            JoinOutcome::Seated(address) | JoinOutcome::AlreadySeated(address) => Some(*address),
            JoinOutcome::Waiting { .. } | JoinOutcome::AlreadyWaiting { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Vacated a slot; the first waiting player may have been moved into it
    LeftSlot {
        address: SlotAddress,
        promoted: Option<PlayerId>,
    },
    LeftWaitingList,
    NotPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    Swapped,
    /// Target was empty, so the player simply moved
    Moved,
    Unchanged,
}

/// Who may rearrange slots by drag-and-drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwapPolicy {
    /// Any participant may move anyone
    Anyone,
    /// The host, or one of the players whose slot changes
    #[default]
    HostOrInvolved,
}

pub fn plan_join(
    lobby: &Lobby,
    candidate: &PlayerSnapshot,
    now: Timestamp,
    allow_waiting: bool,
) -> Result<Plan<JoinOutcome>, LobbyError> {
    if candidate.display_name.trim().is_empty() {
        return Err(LobbyError::InvalidRequest(
            "display name must not be empty".to_string(),
        ));
    }
    if let Some(address) = lobby.find_player(&candidate.player_id) {
        return Ok(Plan::Noop(JoinOutcome::AlreadySeated(address)));
    }
    state_machine::ensure_slots_editable(lobby, "join the lobby")?;

    let waiting_index = lobby
        .waiting_players
        .iter()
        .position(|player| player.player_id == candidate.player_id);
    // Only the head of the queue may take a free slot; everyone else queues
    let ahead = waiting_index.unwrap_or(lobby.waiting_players.len());
    let free_slot = if ahead == 0 {
        assign_slot(lobby, candidate)
    } else {
        None
    };

    match (free_slot, waiting_index) {
        (Some(address), waiting_index) => {
            let mut patch = LobbyPatch::new()
                .change(LobbyChange::Slot(address, Some(candidate.clone())))
                .guard(LobbyGuard::SlotHolds(address, None))
                .guard(LobbyGuard::WaitingPlayersAre(lobby.waiting_players.clone()))
                .guard(LobbyGuard::StateIs(LifecycleState::Open));
            if let Some(index) = waiting_index {
                let mut remaining = lobby.waiting_players.clone();
                remaining.remove(index);
                patch = patch.change(LobbyChange::WaitingPlayers(remaining));
            }
            Ok(Plan::Apply {
                patch: patch.touched_at(now),
                outcome: JoinOutcome::Seated(address),
            })
        }
        (None, Some(index)) => Ok(Plan::Noop(JoinOutcome::AlreadyWaiting {
            position: index + 1,
        })),
        (None, None) if allow_waiting => {
            let mut waiting = lobby.waiting_players.clone();
            waiting.push(candidate.clone());
            let position = waiting.len();
            Ok(Plan::Apply {
                patch: LobbyPatch::new()
                    .change(LobbyChange::WaitingPlayers(waiting))
                    .guard(LobbyGuard::WaitingPlayersAre(lobby.waiting_players.clone()))
                    .guard(LobbyGuard::StateIs(LifecycleState::Open))
                    .touched_at(now),
                outcome: JoinOutcome::Waiting { position },
            })
        }
        (None, None) => Err(LobbyError::LobbyFull {
            occupied: lobby.occupancy(),
            capacity: lobby.capacity(),
        }),
    }
}

pub fn plan_leave(
    lobby: &Lobby,
    player_id: &PlayerId,
    now: Timestamp,
) -> Result<Plan<LeaveOutcome>, LobbyError> {
    if let Some(address) = lobby.find_player(player_id) {
        state_machine::ensure_slots_editable(lobby, "leave the lobby")?;
        let leaving = lobby.slot(address).cloned();
        // An empty waiting list is guarded too: a concurrent append must
        // force a re-plan that promotes the newcomer into the freed slot
        let mut patch = LobbyPatch::new()
            .guard(LobbyGuard::SlotHolds(address, leaving))
            .guard(LobbyGuard::WaitingPlayersAre(lobby.waiting_players.clone()))
            .guard(LobbyGuard::StateIs(LifecycleState::Open));

        let promoted = lobby.waiting_players.first().cloned();
        match &promoted {
            Some(next) => {
                patch = patch
                    .change(LobbyChange::Slot(address, Some(next.clone())))
                    .change(LobbyChange::WaitingPlayers(
                        lobby.waiting_players[1..].to_vec(),
                    ));
            }
            None => patch = patch.change(LobbyChange::Slot(address, None)),
        }

        return Ok(Plan::Apply {
            patch: patch.touched_at(now),
            outcome: LeaveOutcome::LeftSlot {
                address,
                promoted: promoted.map(|player| player.player_id),
            },
        });
    }

    if lobby.is_waiting(player_id) {
        let remaining: Vec<PlayerSnapshot> = lobby
            .waiting_players
            .iter()
            .filter(|player| &player.player_id != player_id)
            .cloned()
            .collect();
        return Ok(Plan::Apply {
            patch: LobbyPatch::new()
                .change(LobbyChange::WaitingPlayers(remaining))
                .guard(LobbyGuard::WaitingPlayersAre(lobby.waiting_players.clone()))
                .touched_at(now),
            outcome: LeaveOutcome::LeftWaitingList,
        });
    }

    Ok(Plan::Noop(LeaveOutcome::NotPresent))
}

pub fn plan_swap(
    lobby: &Lobby,
    actor: &PlayerId,
    source: SlotAddress,
    target: SlotAddress,
    policy: SwapPolicy,
    now: Timestamp,
) -> Result<Plan<SwapOutcome>, LobbyError> {
    for address in [source, target] {
        if !lobby.game_mode.uses(address) {
            return Err(LobbyError::InvalidRequest(format!(
                "{} is not used in {} lobbies",
                address, lobby.game_mode
            )));
        }
    }
    state_machine::ensure_slots_editable(lobby, "swap slots")?;
    if source == target {
        return Ok(Plan::Noop(SwapOutcome::Unchanged));
    }

    let Some(moving) = lobby.slot(source).cloned() else {
        return Err(LobbyError::InvalidRequest(format!("{} is empty", source)));
    };
    let displaced = lobby.slot(target).cloned();

    if policy == SwapPolicy::HostOrInvolved {
        let involved = moving.player_id == *actor
            || displaced.as_ref().is_some_and(|player| player.player_id == *actor);
        if !lobby.is_host(actor) && !involved {
            return Err(LobbyError::Unauthorized {
                actor: actor.to_string(),
                action: "rearrange other players",
            });
        }
    }

    let swapped = resolve_swap(lobby, source, target);
    let outcome = if displaced.is_some() {
        SwapOutcome::Swapped
    } else {
        SwapOutcome::Moved
    };
    Ok(Plan::Apply {
        patch: LobbyPatch::new()
            .change(LobbyChange::Slot(source, swapped.slot(source).cloned()))
            .change(LobbyChange::Slot(target, swapped.slot(target).cloned()))
            .guard(LobbyGuard::SlotHolds(source, Some(moving)))
            .guard(LobbyGuard::SlotHolds(target, displaced))
            .guard(LobbyGuard::StateIs(LifecycleState::Open))
            .touched_at(now),
        outcome,
    })
}

/// Validate a lifecycle event and build the patch that records it
pub fn plan_transition(
    lobby: &Lobby,
    actor: &PlayerId,
    event: &LifecycleEvent,
    context: &TransitionContext,
) -> Result<Plan<Transition>, LobbyError> {
    let transition = state_machine::apply(lobby, actor, event, context)?;
    let now = context.now;

    let mut patch = LobbyPatch::new()
        .change(LobbyChange::State(transition.to))
        .guard(LobbyGuard::StateIs(transition.from));

    match event {
        LifecycleEvent::StartCountdown => {
            for address in lobby.game_mode.slots() {
                patch = patch.guard(LobbyGuard::SlotOccupied(*address));
            }
        }
        LifecycleEvent::AdvanceCountdown => {
            if transition.to == LifecycleState::InProgress {
                patch = patch.change(LobbyChange::StartedAt(now));
            }
        }
        LifecycleEvent::Cancel { reason } => {
            patch = patch
                .change(LobbyChange::CancelReason(reason.clone()))
                .change(LobbyChange::CompletedAt(now));
        }
        LifecycleEvent::Complete { score } => {
            patch = patch
                .change(LobbyChange::FinalScore(*score))
                .change(LobbyChange::CompletedAt(now));
        }
    }

    Ok(Plan::Apply {
        patch: patch.touched_at(now),
        outcome: transition,
    })
}

/// Fresh lobby for a rematch: same host, mode and seating, new room code
pub fn build_rematch(
    previous: &Lobby,
    actor: &PlayerId,
    room_code: RoomCode,
    now: Timestamp,
) -> Result<Lobby, LobbyError> {
    state_machine::ensure_host(previous, actor, "start a rematch")?;
    if !previous.state.is_terminal() {
        return Err(LobbyError::IllegalTransition {
            action: "start a rematch",
            state: previous.state,
            detail: "the current match is not over".to_string(),
        });
    }
    if let Some(existing) = &previous.rematch_code {
        return Err(LobbyError::IllegalTransition {
            action: "start a rematch",
            state: previous.state,
            detail: format!("rematch {} already exists", existing),
        });
    }

    Ok(Lobby {
        room_code,
        host_id: previous.host_id.clone(),
        game_mode: previous.game_mode,
        team1: previous.team1.clone(),
        team2: previous.team2.clone(),
        waiting_players: Vec::new(),
        state: LifecycleState::Open,
        created_at: now,
        last_activity_at: now,
        started_at: None,
        completed_at: None,
        cancel_reason: None,
        final_score: None,
        rematch_of: Some(previous.room_code.clone()),
        rematch_code: None,
    })
}

/// Point the superseded lobby at its rematch
pub fn plan_rematch_link(previous: &Lobby, rematch: &RoomCode, now: Timestamp) -> LobbyPatch {
    LobbyPatch::new()
        .change(LobbyChange::RematchCode(rematch.clone()))
        .guard(LobbyGuard::StateIs(previous.state))
        .touched_at(now)
}
