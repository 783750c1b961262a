//! Lobby lifecycle state machine.
//!
//! ```text
//! OPEN ──start──▶ COUNTDOWN(0 → 1 → START) ──advance──▶ IN_PROGRESS ──complete──▶ COMPLETED
//!   │                     │                                   │
//!   └─────────────────────┴────────────── cancel ─────────────┴──▶ CANCELLED
//! ```
//!
//! Every lifecycle event is host-only. The one exception is advancing a
//! countdown the host has abandoned: after `stall_takeover_after` without
//! activity, any seated player may push it forward.

use std::time::Duration;

use super::{
    entity::{CountdownTick, FinalScore, LifecycleState, Lobby},
    error::LobbyError,
    value_object::{PlayerId, SlotAddress, Timestamp},
};

/// Host-driven lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    StartCountdown,
    AdvanceCountdown,
    Cancel { reason: Option<String> },
    Complete { score: FinalScore },
}

impl LifecycleEvent {
    /// Human-readable verb phrase for error messages
    pub fn action(&self) -> &'static str {
        match self {
            LifecycleEvent::StartCountdown => "start the countdown",
            LifecycleEvent::AdvanceCountdown => "advance the countdown",
            LifecycleEvent::Cancel { .. } => "cancel the match",
            LifecycleEvent::Complete { .. } => "complete the match",
        }
    }
}

/// Delay spent on each countdown tick before advancing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTimings {
    pub zero: Duration,
    pub one: Duration,
    pub start: Duration,
}

impl Default for CountdownTimings {
    fn default() -> Self {
        Self {
            zero: Duration::from_millis(1000),
            one: Duration::from_millis(1000),
            start: Duration::from_millis(800),
        }
    }
}

impl CountdownTimings {
    pub fn delay(&self, tick: CountdownTick) -> Duration {
        match tick {
            CountdownTick::Zero => self.zero,
            CountdownTick::One => self.one,
            CountdownTick::Start => self.start,
        }
    }

    /// Total time from COUNTDOWN(0) to IN_PROGRESS
    pub fn total(&self) -> Duration {
        self.zero + self.one + self.start
    }
}

/// Inputs a transition may depend on besides the lobby itself
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext {
    pub now: Timestamp,
    pub stall_takeover_after: Duration,
}

/// Accepted lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: LifecycleState,
    pub to: LifecycleState,
    /// Advanced by a participant because the host went quiet
    pub by_takeover: bool,
}

/// All slots the game mode needs are occupied
pub fn can_start(lobby: &Lobby) -> bool {
    missing_slots(lobby).is_empty()
}

/// Mandatory slots that are still empty
pub fn missing_slots(lobby: &Lobby) -> Vec<SlotAddress> {
    lobby
        .game_mode
        .slots()
        .iter()
        .copied()
        .filter(|address| lobby.slot(*address).is_none())
        .collect()
}

pub fn ensure_host(
    lobby: &Lobby,
    actor: &PlayerId,
    action: &'static str,
) -> Result<(), LobbyError> {
    if lobby.is_host(actor) {
        Ok(())
    } else {
        Err(LobbyError::Unauthorized {
            actor: actor.to_string(),
            action,
        })
    }
}

/// Slot edits (join, leave, swap) are only allowed while OPEN
pub fn ensure_slots_editable(lobby: &Lobby, action: &'static str) -> Result<(), LobbyError> {
    if lobby.state == LifecycleState::Open {
        Ok(())
    } else {
        Err(LobbyError::IllegalTransition {
            action,
            state: lobby.state,
            detail: "slots are locked once the countdown has begun".to_string(),
        })
    }
}

/// The countdown has seen no activity for at least `after`
pub fn countdown_stalled(lobby: &Lobby, now: Timestamp, after: Duration) -> bool {
    let idle = lobby.last_activity_at.millis_until(now);
    matches!(lobby.state, LifecycleState::Countdown(_))
        && u128::try_from(idle).is_ok_and(|idle| idle >= after.as_millis())
}

/// Validate `event` issued by `actor` against `lobby` and compute the transition.
pub fn apply(
    lobby: &Lobby,
    actor: &PlayerId,
    event: &LifecycleEvent,
    context: &TransitionContext,
) -> Result<Transition, LobbyError> {
    let action = event.action();
    let from = lobby.state;
    let illegal = |detail: String| LobbyError::IllegalTransition {
        action,
        state: from,
        detail,
    };

    match event {
        LifecycleEvent::StartCountdown => {
            ensure_host(lobby, actor, action)?;
            if from != LifecycleState::Open {
                return Err(illegal("the countdown can only start from OPEN".to_string()));
            }
            let missing = missing_slots(lobby);
            if !missing.is_empty() {
                return Err(illegal(format!(
                    "{}/{} slots filled, waiting for {}",
                    lobby.occupancy(),
                    lobby.capacity(),
                    missing
                        .iter()
                        .map(|address| address.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
            Ok(Transition {
                from,
                to: LifecycleState::Countdown(CountdownTick::Zero),
                by_takeover: false,
            })
        }
        LifecycleEvent::AdvanceCountdown => {
            let by_takeover = if lobby.is_host(actor) {
                false
            } else if lobby.find_player(actor).is_some()
                && countdown_stalled(lobby, context.now, context.stall_takeover_after)
            {
                true
            } else {
                return Err(LobbyError::Unauthorized {
                    actor: actor.to_string(),
                    action,
                });
            };
            let Some(tick) = from.countdown_tick() else {
                return Err(illegal("no countdown is running".to_string()));
            };
            let to = match tick.next() {
                Some(next) => LifecycleState::Countdown(next),
                None => LifecycleState::InProgress,
            };
            Ok(Transition {
                from,
                to,
                by_takeover,
            })
        }
        LifecycleEvent::Cancel { .. } => {
            ensure_host(lobby, actor, action)?;
            if from.is_terminal() {
                return Err(illegal("the match is already over".to_string()));
            }
            Ok(Transition {
                from,
                to: LifecycleState::Cancelled,
                by_takeover: false,
            })
        }
        LifecycleEvent::Complete { .. } => {
            ensure_host(lobby, actor, action)?;
            if from != LifecycleState::InProgress {
                return Err(illegal("only a match in progress can be completed".to_string()));
            }
            Ok(Transition {
                from,
                to: LifecycleState::Completed,
                by_takeover: false,
            })
        }
    }
}
