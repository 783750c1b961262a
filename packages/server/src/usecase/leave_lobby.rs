//! UseCase: ロビー退出
//!
//! 着席者が抜けた場合、待機リストの先頭のプレイヤーを同じ書き込みで
//! 空いたスロットに繰り上げます。カウントダウン開始後は着席者は抜けられません。

use std::sync::Arc;

use crate::domain::{LeaveOutcome, LobbyError, PlayerId, RoomCode, planner};

use super::coordinator::{Committed, LobbyCoordinator};

/// ロビー退出のユースケース
pub struct LeaveLobbyUseCase {
    coordinator: Arc<LobbyCoordinator>,
}

impl LeaveLobbyUseCase {
    pub fn new(coordinator: Arc<LobbyCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn execute(
        &self,
        room_code: &RoomCode,
        player_id: &PlayerId,
    ) -> Result<Committed<LeaveOutcome>, LobbyError> {
        let committed = self
            .coordinator
            .mutate(room_code, "leave the lobby", |lobby, now| {
                planner::plan_leave(lobby, player_id, now)
            })
            .await?;

        match &committed.outcome {
            LeaveOutcome::LeftSlot { address, promoted } => {
                tracing::info!("'{}' left {} in lobby {}", player_id, address, room_code);
                if let Some(promoted) = promoted {
                    tracing::info!(
                        "'{}' promoted from the waiting list to {}",
                        promoted,
                        address
                    );
                }
            }
            LeaveOutcome::LeftWaitingList => tracing::info!(
                "'{}' left the waiting list of lobby {}",
                player_id,
                room_code
            ),
            LeaveOutcome::NotPresent => {}
        }
        Ok(committed)
    }
}
