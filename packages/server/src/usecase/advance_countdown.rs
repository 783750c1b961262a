//! UseCase: カウントダウン進行
//!
//! 呼び出し側が観測したティック（`seen`）を条件に 1 段階だけ進めます。
//! 最新の状態が既に `seen` から進んでいれば何もしません。これにより、
//! ホストと引き継ぎ参加者が同時に進めても二重に進むことはありません。

use std::sync::Arc;

use crate::domain::{
    CountdownTick, LifecycleEvent, LifecycleState, Lobby, LobbyError, PlayerId, Plan, RoomCode,
    Transition, TransitionContext, planner,
};

use super::coordinator::LobbyCoordinator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Advanced { transition: Transition, lobby: Lobby },
    /// Someone else moved the countdown past the tick we saw
    AlreadyAdvanced(Lobby),
}

impl AdvanceOutcome {
    pub fn lobby(&self) -> &Lobby {
        match self {
            AdvanceOutcome::Advanced { lobby, .. } | AdvanceOutcome::AlreadyAdvanced(lobby) => {
                lobby
            }
        }
    }

    pub fn into_lobby(self) -> Lobby {
        match self {
            AdvanceOutcome::Advanced { lobby, .. } | AdvanceOutcome::AlreadyAdvanced(lobby) => {
                lobby
            }
        }
    }
}

/// カウントダウン進行のユースケース
pub struct AdvanceCountdownUseCase {
    coordinator: Arc<LobbyCoordinator>,
}

impl AdvanceCountdownUseCase {
    pub fn new(coordinator: Arc<LobbyCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn execute(
        &self,
        room_code: &RoomCode,
        actor: &PlayerId,
        seen: CountdownTick,
    ) -> Result<AdvanceOutcome, LobbyError> {
        let stall_takeover_after = self.coordinator.config().stall_takeover_after;
        let committed = self
            .coordinator
            .mutate(room_code, "advance the countdown", |lobby, now| {
                if lobby.state != LifecycleState::Countdown(seen) {
                    return Ok(Plan::Noop(None));
                }
                let context = TransitionContext {
                    now,
                    stall_takeover_after,
                };
                match planner::plan_transition(
                    lobby,
                    actor,
                    &LifecycleEvent::AdvanceCountdown,
                    &context,
                )? {
                    Plan::Apply { patch, outcome } => Ok(Plan::Apply {
                        patch,
                        outcome: Some(outcome),
                    }),
                    Plan::Noop(outcome) => Ok(Plan::Noop(Some(outcome))),
                }
            })
            .await?;

        let Some(transition) = committed.outcome else {
            tracing::debug!(
                "Countdown of lobby {} already moved past {}",
                room_code,
                seen
            );
            return Ok(AdvanceOutcome::AlreadyAdvanced(committed.lobby));
        };

        if transition.by_takeover {
            tracing::warn!(
                "'{}' took over the stalled countdown of lobby {}: {} -> {}",
                actor,
                room_code,
                transition.from,
                transition.to
            );
        } else {
            tracing::info!(
                "Lobby {}: {} -> {}",
                room_code,
                transition_label(transition.from),
                transition_label(transition.to)
            );
        }
        Ok(AdvanceOutcome::Advanced {
            transition,
            lobby: committed.lobby,
        })
    }
}

fn transition_label(state: LifecycleState) -> String {
    match state {
        LifecycleState::Countdown(tick) => format!("COUNTDOWN({})", tick),
        other => other.to_string(),
    }
}
