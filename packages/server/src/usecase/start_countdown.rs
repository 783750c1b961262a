//! UseCase: カウントダウン開始（ホストのみ）
//!
//! 全スロットが埋まっていることと OPEN であることを、ホスト確認のあとに
//! 最新の状態で判断し、同じ条件を事前条件として書き込みます。

use std::sync::Arc;

use crate::domain::{
    LifecycleEvent, LobbyError, PlayerId, RoomCode, Transition, TransitionContext, planner,
};

use super::coordinator::{Committed, LobbyCoordinator};

/// カウントダウン開始のユースケース
pub struct StartCountdownUseCase {
    coordinator: Arc<LobbyCoordinator>,
}

impl StartCountdownUseCase {
    pub fn new(coordinator: Arc<LobbyCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn execute(
        &self,
        room_code: &RoomCode,
        actor: &PlayerId,
    ) -> Result<Committed<Transition>, LobbyError> {
        let stall_takeover_after = self.coordinator.config().stall_takeover_after;
        let committed = self
            .coordinator
            .mutate(room_code, "start the countdown", |lobby, now| {
                let context = TransitionContext {
                    now,
                    stall_takeover_after,
                };
                planner::plan_transition(lobby, actor, &LifecycleEvent::StartCountdown, &context)
            })
            .await?;

        tracing::info!(
            "Lobby {}: {} -> {} by '{}'",
            room_code,
            committed.outcome.from,
            committed.outcome.to,
            actor
        );
        Ok(committed)
    }
}
