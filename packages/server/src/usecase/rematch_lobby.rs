//! UseCase: 再戦（ホストのみ）
//!
//! 終了した（COMPLETED / CANCELLED）ロビーから、同じホスト・モード・配置の
//! 新しいロビーを作成し、元のロビーに `rematchCode` を書き込みます。
//! 他の参加者は元のロビーの購読でこのコードを受け取り、新しいロビーへ移れます。

use std::sync::Arc;

use crate::domain::{Lobby, LobbyError, PlayerId, Plan, RoomCode, RoomCodeFactory, planner};

use super::{
    coordinator::LobbyCoordinator,
    create_lobby::{CodeGenerator, create_with_fresh_code},
};

/// 再戦のユースケース
pub struct RematchLobbyUseCase {
    coordinator: Arc<LobbyCoordinator>,
    generate_code: CodeGenerator,
}

impl RematchLobbyUseCase {
    pub fn new(coordinator: Arc<LobbyCoordinator>) -> Self {
        Self::with_code_generator(coordinator, Box::new(RoomCodeFactory::generate))
    }

    /// room code の生成方法を差し替える（テスト用）
    pub fn with_code_generator(
        coordinator: Arc<LobbyCoordinator>,
        generate_code: CodeGenerator,
    ) -> Self {
        Self {
            coordinator,
            generate_code,
        }
    }

    /// 新しいロビーを作成して返す
    pub async fn execute(
        &self,
        room_code: &RoomCode,
        actor: &PlayerId,
    ) -> Result<Lobby, LobbyError> {
        let previous = self.coordinator.load(room_code).await?;
        // Validate before drawing a code so a refused rematch creates nothing
        let template =
            planner::build_rematch(&previous, actor, room_code.clone(), self.coordinator.now())?;

        let rematch = create_with_fresh_code(&self.coordinator, &self.generate_code, |code, now| {
            Lobby {
                room_code: code,
                created_at: now,
                last_activity_at: now,
                ..template.clone()
            }
        })
        .await?;

        let new_code = rematch.room_code.clone();
        self.coordinator
            .mutate(room_code, "link the rematch", |lobby, now| {
                if let Some(existing) = &lobby.rematch_code {
                    return Err(LobbyError::IllegalTransition {
                        action: "start a rematch",
                        state: lobby.state,
                        detail: format!("rematch {} already exists", existing),
                    });
                }
                Ok(Plan::Apply {
                    patch: planner::plan_rematch_link(lobby, &new_code, now),
                    outcome: (),
                })
            })
            .await?;

        tracing::info!(
            "Lobby {} rematched as {} by '{}'",
            room_code,
            rematch.room_code,
            actor
        );
        Ok(rematch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{FinalScore, GameMode, LifecycleState, entity::fixtures::*},
        usecase::coordinator::test_support::*,
    };

    #[tokio::test]
    async fn test_rematch_creates_linked_lobby() {
        // テスト項目: 再戦で同じ配置の新しいロビーが作られ、元のロビーにコードが書き込まれる
        // given (前提条件):
        let harness = Harness::conditional();
        let mut lobby = seated_lobby(GameMode::Doubles, &["alice", "bob", "carol", "dave"]);
        lobby.state = LifecycleState::Completed;
        lobby.final_score = Some(FinalScore::new(21, 12));
        harness.put(&lobby).await;
        let usecase = RematchLobbyUseCase::new(harness.coordinator.clone());

        // when (操作):
        let rematch = usecase
            .execute(&lobby.room_code, &player_id("alice"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_ne!(rematch.room_code, lobby.room_code);
        assert_eq!(rematch.state, LifecycleState::Open);
        assert_eq!(rematch.team1, lobby.team1);
        assert_eq!(rematch.team2, lobby.team2);
        assert_eq!(harness.get(&rematch).await, rematch);
        let previous = harness.get(&lobby).await;
        assert_eq!(previous.rematch_code, Some(rematch.room_code.clone()));
        assert_eq!(previous.state, LifecycleState::Completed);
    }

    #[tokio::test]
    async fn test_rematch_of_running_match_is_refused_without_side_effects() {
        // テスト項目: 試合中のロビーからは再戦できず、新しいロビーも作られない
        // given (前提条件):
        let harness = Harness::conditional();
        let mut lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        lobby.state = LifecycleState::InProgress;
        harness.put(&lobby).await;
        let usecase = RematchLobbyUseCase::new(harness.coordinator.clone());

        // when (操作):
        let result = usecase.execute(&lobby.room_code, &player_id("alice")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(LobbyError::IllegalTransition { .. })));
        assert_eq!(harness.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_rematch_draws_another_code_on_collision() {
        // テスト項目: 再戦の room code が衝突したら別のコードで作り、そのコードを元のロビーに書き込む
        // given (前提条件): TAKEN1 は既に使われている
        let harness = Harness::conditional();
        let mut lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        lobby.state = LifecycleState::Cancelled;
        harness.put(&lobby).await;
        let mut taken = seated_lobby(GameMode::Singles, &["zoe"]);
        taken.room_code = RoomCode::new("TAKEN1".to_string()).unwrap();
        harness.put(&taken).await;
        let usecase = RematchLobbyUseCase::with_code_generator(
            harness.coordinator.clone(),
            scripted_codes(&["TAKEN1", "FRESH1"]),
        );

        // when (操作):
        let rematch = usecase
            .execute(&lobby.room_code, &player_id("alice"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(rematch.room_code.as_str(), "FRESH1");
        assert_eq!(harness.get(&taken).await, taken);
        assert_eq!(
            harness.get(&lobby).await.rematch_code,
            Some(rematch.room_code.clone())
        );
    }
}
