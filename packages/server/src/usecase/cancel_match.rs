//! UseCase: 試合キャンセル（ホストのみ）
//!
//! OPEN / COUNTDOWN / IN_PROGRESS のどこからでも CANCELLED に移れます。
//! キャンセルされたロビーは `completed = true`（未完了一覧から外れる）かつ
//! `cancelled = true`（レーティング集計の対象外）になり、結果は公開されません。

use std::sync::Arc;

use crate::domain::{
    LifecycleEvent, LobbyError, PlayerId, RoomCode, Transition, TransitionContext, planner,
};

use super::coordinator::{Committed, LobbyCoordinator};

/// 試合キャンセルのユースケース
pub struct CancelMatchUseCase {
    coordinator: Arc<LobbyCoordinator>,
}

impl CancelMatchUseCase {
    pub fn new(coordinator: Arc<LobbyCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn execute(
        &self,
        room_code: &RoomCode,
        actor: &PlayerId,
        reason: Option<String>,
    ) -> Result<Committed<Transition>, LobbyError> {
        let stall_takeover_after = self.coordinator.config().stall_takeover_after;
        let event = LifecycleEvent::Cancel { reason };
        let committed = self
            .coordinator
            .mutate(room_code, event.action(), |lobby, now| {
                let context = TransitionContext {
                    now,
                    stall_takeover_after,
                };
                planner::plan_transition(lobby, actor, &event, &context)
            })
            .await?;

        tracing::info!(
            "Lobby {} cancelled by '{}' (was {}){}",
            room_code,
            actor,
            committed.outcome.from,
            committed
                .lobby
                .cancel_reason
                .as_deref()
                .map(|reason| format!(": {}", reason))
                .unwrap_or_default()
        );
        Ok(committed)
    }
}
