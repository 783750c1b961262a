//! UseCase: スロット入れ替え（ドラッグ＆ドロップ）
//!
//! UI で確定した `SwapRequest` を共有ストアに反映します。入れ替え元と
//! 入れ替え先の両方が判断時の状態のままであることを条件に書き込みます。
//!
//! 競合に負けて読み直したとき、ドラッグしたプレイヤーがもう入れ替え元に
//! いなければ、そのドラッグは成立しないため `ConcurrencyLost` を返します
//! （呼び出し側は表示を元に戻す）。

use std::sync::Arc;

use crate::domain::{LobbyError, PlayerId, RoomCode, SwapOutcome, SwapRequest, planner};

use super::coordinator::{Committed, LobbyCoordinator};

const OPERATION: &str = "swap slots";

/// スロット入れ替えのユースケース
pub struct SwapSlotsUseCase {
    coordinator: Arc<LobbyCoordinator>,
}

impl SwapSlotsUseCase {
    pub fn new(coordinator: Arc<LobbyCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn execute(
        &self,
        room_code: &RoomCode,
        actor: &PlayerId,
        request: SwapRequest,
    ) -> Result<Committed<SwapOutcome>, LobbyError> {
        let policy = self.coordinator.config().swap_policy;
        let mut dragged: Option<PlayerId> = None;
        let mut attempts = 0;

        let committed = self
            .coordinator
            .mutate(room_code, OPERATION, |lobby, now| {
                attempts += 1;
                let occupant = lobby
                    .slot(request.source)
                    .map(|player| player.player_id.clone());
                match &dragged {
                    None => dragged = occupant,
                    Some(expected) if occupant.as_ref() != Some(expected) => {
                        return Err(LobbyError::ConcurrencyLost {
                            operation: OPERATION,
                            attempts,
                        });
                    }
                    Some(_) => {}
                }
                planner::plan_swap(lobby, actor, request.source, request.target, policy, now)
            })
            .await?;

        if committed.outcome != SwapOutcome::Unchanged {
            tracing::info!(
                "'{}' moved {} to {} in lobby {} ({:?})",
                actor,
                request.source,
                request.target,
                room_code,
                committed.outcome
            );
        }
        Ok(committed)
    }
}
