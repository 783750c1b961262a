//! UseCase: 試合完了（ホストのみ）
//!
//! IN_PROGRESS のロビーに最終スコアを記録して COMPLETED にし、
//! 結果を MatchResultPublisher（スコア・レーティング集計側）に渡します。
//!
//! ロビーの完了はストアに確定済みのため、公開に失敗してもユースケースは
//! 失敗させず、`published = false` として呼び出し元に伝えます。

use std::sync::Arc;

use crate::domain::{
    FinalScore, LifecycleEvent, Lobby, LobbyError, MatchResultPublisher, PlayerId, RoomCode,
    TransitionContext, planner,
};

use super::coordinator::LobbyCoordinator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedMatch {
    pub lobby: Lobby,
    /// The rating consumer accepted the result
    pub published: bool,
}

/// 試合完了のユースケース
pub struct CompleteMatchUseCase {
    coordinator: Arc<LobbyCoordinator>,
    /// MatchResultPublisher（結果通知の抽象化）
    publisher: Arc<dyn MatchResultPublisher>,
}

impl CompleteMatchUseCase {
    pub fn new(
        coordinator: Arc<LobbyCoordinator>,
        publisher: Arc<dyn MatchResultPublisher>,
    ) -> Self {
        Self {
            coordinator,
            publisher,
        }
    }

    pub async fn execute(
        &self,
        room_code: &RoomCode,
        actor: &PlayerId,
        score: FinalScore,
    ) -> Result<CompletedMatch, LobbyError> {
        let stall_takeover_after = self.coordinator.config().stall_takeover_after;
        let event = LifecycleEvent::Complete { score };
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
            "Lobby {} completed {}-{}",
            room_code,
            score.team1,
            score.team2
        );

        let published = match committed.lobby.match_record() {
            Some(record) => match self.publisher.publish(record).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("Failed to publish result of lobby {}: {}", room_code, e);
                    false
                }
            },
            None => false,
        };

        Ok(CompletedMatch {
            lobby: committed.lobby,
            published,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            GameMode, LifecycleState, PublishError, entity::fixtures::*,
            publisher::MockMatchResultPublisher,
        },
        infrastructure::publisher::ChannelMatchResultPublisher,
        usecase::coordinator::test_support::*,
    };

    async fn in_progress(harness: &Harness) -> Lobby {
        let mut lobby = seated_lobby(GameMode::Doubles, &["alice", "bob", "carol", "dave"]);
        lobby.state = LifecycleState::InProgress;
        harness.put(&lobby).await;
        lobby
    }

    #[tokio::test]
    async fn test_complete_publishes_match_record() {
        // テスト項目: 試合完了でスコアが記録され、結果が集計側に届く
        // given (前提条件):
        let harness = Harness::conditional();
        let lobby = in_progress(&harness).await;
        let (publisher, mut results) = ChannelMatchResultPublisher::channel();
        let usecase = CompleteMatchUseCase::new(harness.coordinator.clone(), Arc::new(publisher));

        // when (操作):
        let completed = usecase
            .execute(&lobby.room_code, &player_id("alice"), FinalScore::new(21, 17))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(completed.published);
        assert_eq!(completed.lobby.state, LifecycleState::Completed);
        let record = results.recv().await.unwrap();
        assert_eq!(record.score, FinalScore::new(21, 17));
        assert_eq!(record.team1, vec![player("alice"), player("bob")]);
        assert_eq!(record.team2, vec![player("carol"), player("dave")]);
        assert_eq!(harness.get(&lobby).await.final_score, Some(FinalScore::new(21, 17)));
    }

    #[tokio::test]
    async fn test_complete_requires_in_progress() {
        // テスト項目: 試合中でなければ完了できず、結果も公開されない
        // given (前提条件):
        let harness = Harness::conditional();
        let lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        harness.put(&lobby).await;
        let mut publisher = MockMatchResultPublisher::new();
        publisher.expect_publish().never();
        let usecase = CompleteMatchUseCase::new(harness.coordinator.clone(), Arc::new(publisher));

        // when (操作):
        let result = usecase
            .execute(&lobby.room_code, &player_id("alice"), FinalScore::new(1, 0))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(LobbyError::IllegalTransition { .. })));
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_undo_completion() {
        // テスト項目: 公開に失敗してもロビーは COMPLETED のまま、published = false を返す
        // given (前提条件):
        let harness = Harness::conditional();
        let lobby = in_progress(&harness).await;
        let mut publisher = MockMatchResultPublisher::new();
        publisher
            .expect_publish()
            .times(1)
            .returning(|_| Err(PublishError::ConsumerClosed));
        let usecase = CompleteMatchUseCase::new(harness.coordinator.clone(), Arc::new(publisher));

        // when (操作):
        let completed = usecase
            .execute(&lobby.room_code, &player_id("alice"), FinalScore::new(15, 21))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(!completed.published);
        assert_eq!(harness.get(&lobby).await.state, LifecycleState::Completed);
    }
}
