//! UseCase: ロビー参加（自動スロット割り当て）
//!
//! 1. 最新のロビーを読む
//! 2. `assign_slot` で座るスロットを決める（満員なら待機リストへ）
//! 3. 「そのスロットが空いていること」を条件に書き込む
//! 4. 負けたら最新の状態で 1 からやり直す（上限あり）
//!
//! 待機リストが有効な場合、負けた回数が上限に達しても待機リストへの追加は
//! まだ可能なので、バックオフを挟んで `join_rounds` 回まで続けます。
//! それでも負けた場合は再試行可能な `ConcurrencyLost` を返します。
//! 待機リストが無効で、最新のロビーが満員なら `LobbyFull` を返します。
//!
//! ## テスト実装の作業記録
//!
//! ### どのような状況を想定しているか
//! - 正常系：空きスロットへの着席、満員時の待機リスト追加
//! - 冪等性：着席済みプレイヤーの再参加
//! - 異常系：存在しないロビー、カウントダウン開始後の参加
//! - 競合：複数クライアントの同時参加は `tests/concurrency_test.rs` で検証

use std::sync::Arc;

use crate::domain::{JoinOutcome, LobbyError, PlayerSnapshot, RoomCode, planner};

use super::coordinator::{Committed, LobbyCoordinator};

/// ロビー参加のユースケース
pub struct JoinLobbyUseCase {
    coordinator: Arc<LobbyCoordinator>,
}

impl JoinLobbyUseCase {
    pub fn new(coordinator: Arc<LobbyCoordinator>) -> Self {
        Self { coordinator }
    }

    /// `candidate` をロビーに参加させる
    pub async fn execute(
        &self,
        room_code: &RoomCode,
        candidate: PlayerSnapshot,
    ) -> Result<Committed<JoinOutcome>, LobbyError> {
        let config = self.coordinator.config();
        let allow_waiting = config.waiting_list;
        // Every lost race means another joiner landed, so queueing keeps going
        let rounds = if allow_waiting {
            config.join_rounds.max(1)
        } else {
            1
        };

        let mut round = 0;
        let result = loop {
            round += 1;
            let result = self
                .coordinator
                .mutate(room_code, "join the lobby", |lobby, now| {
                    planner::plan_join(lobby, &candidate, now, allow_waiting)
                })
                .await;
            match result {
                Err(LobbyError::ConcurrencyLost { .. }) if round < rounds => {
                    let delay = config.retry.backoff(round);
                    tracing::warn!(
                        "'{}' is still contending for lobby {}, retrying in {:?} (round {}/{})",
                        candidate.player_id,
                        room_code,
                        delay,
                        round,
                        rounds
                    );
                    tokio::time::sleep(delay).await;
                }
                result => break result,
            }
        };

        match result {
            Ok(committed) => {
                match committed.outcome {
                    JoinOutcome::Seated(address) => tracing::info!(
                        "'{}' joined lobby {} at {}",
                        candidate.player_id,
                        room_code,
                        address
                    ),
                    JoinOutcome::Waiting { position } => tracing::info!(
                        "'{}' is waiting for a slot in lobby {} (#{})",
                        candidate.player_id,
                        room_code,
                        position
                    ),
                    JoinOutcome::AlreadySeated(_) | JoinOutcome::AlreadyWaiting { .. } => {}
                }
                Ok(committed)
            }
            Err(LobbyError::ConcurrencyLost {
                operation,
                attempts,
            }) => {
                let lobby = self.coordinator.load(room_code).await?;
                tracing::warn!(
                    "'{}' could not join lobby {} after {} attempts",
                    candidate.player_id,
                    room_code,
                    attempts
                );
                if !allow_waiting && lobby.occupancy() >= lobby.capacity() {
                    return Err(LobbyError::LobbyFull {
                        occupied: lobby.occupancy(),
                        capacity: lobby.capacity(),
                    });
                }
                Err(LobbyError::ConcurrencyLost {
                    operation,
                    attempts,
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            CountdownTick, GameMode, LifecycleState, SlotAddress, StoreCapabilities, StoreError,
            entity::fixtures::*, store::MockSharedLobbyStore,
        },
        infrastructure::dto::encode_lobby,
        usecase::{CoordinatorConfig, RetryPolicy, coordinator::test_support::*},
    };
    use courtlobby_shared::time::ManualClock;

    #[tokio::test]
    async fn test_doubles_fill_order() {
        // テスト項目: DOUBLES で Alice がホスト、Bob → team1.slot2、Carol → team2.slot1 の順に座る
        // given (前提条件):
        let harness = Harness::conditional();
        let lobby = lobby(GameMode::Doubles, "alice");
        harness.put(&lobby).await;
        let usecase = JoinLobbyUseCase::new(harness.coordinator.clone());

        // when (操作):
        let bob = usecase.execute(&lobby.room_code, player("bob")).await.unwrap();
        let carol = usecase.execute(&lobby.room_code, player("carol")).await.unwrap();

        // then (期待する結果):
        assert_eq!(bob.outcome, JoinOutcome::Seated(SlotAddress::TEAM1_SLOT2));
        assert_eq!(carol.outcome, JoinOutcome::Seated(SlotAddress::TEAM2_SLOT1));
        let stored = harness.get(&lobby).await;
        assert_eq!(stored.slot(SlotAddress::TEAM1_SLOT2), Some(&player("bob")));
        assert_eq!(stored.slot(SlotAddress::TEAM2_SLOT1), Some(&player("carol")));
        assert_eq!(stored, carol.lobby);
    }

    #[tokio::test]
    async fn test_rejoin_is_idempotent() {
        // テスト項目: 同じプレイヤーが 2 回参加しても同じスロットのまま
        // given (前提条件):
        let harness = Harness::conditional();
        let lobby = lobby(GameMode::Singles, "alice");
        harness.put(&lobby).await;
        let usecase = JoinLobbyUseCase::new(harness.coordinator.clone());

        // when (操作):
        let first = usecase.execute(&lobby.room_code, player("bob")).await.unwrap();
        let second = usecase.execute(&lobby.room_code, player("bob")).await.unwrap();

        // then (期待する結果):
        assert_eq!(first.outcome, JoinOutcome::Seated(SlotAddress::TEAM2_SLOT1));
        assert_eq!(second.outcome, JoinOutcome::AlreadySeated(SlotAddress::TEAM2_SLOT1));
        assert_eq!(harness.get(&lobby).await.occupancy(), 2);
    }

    #[tokio::test]
    async fn test_full_lobby_without_waiting_list_is_rejected() {
        // テスト項目: 待機リスト無効の満員ロビーへの参加は "Room is full (2/2)" になる
        // given (前提条件):
        let harness = Harness::new(
            crate::infrastructure::store::InMemoryLobbyStore::conditional(),
            CoordinatorConfig {
                waiting_list: false,
                ..fast_config()
            },
        );
        let lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        harness.put(&lobby).await;
        let usecase = JoinLobbyUseCase::new(harness.coordinator.clone());

        // when (操作):
        let result = usecase.execute(&lobby.room_code, player("carol")).await;

        // then (期待する結果):
        let error = result.unwrap_err();
        assert_eq!(error.to_string(), "Room is full (2/2)");
    }

    #[tokio::test]
    async fn test_join_during_countdown_is_illegal() {
        // テスト項目: カウントダウン中のロビーには参加できず、状態も変わらない
        // given (前提条件):
        let harness = Harness::conditional();
        let mut lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        lobby.state = LifecycleState::Countdown(CountdownTick::One);
        harness.put(&lobby).await;
        let usecase = JoinLobbyUseCase::new(harness.coordinator.clone());

        // when (操作):
        let result = usecase.execute(&lobby.room_code, player("carol")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(LobbyError::IllegalTransition { .. })));
        assert_eq!(harness.get(&lobby).await, lobby);
    }

    #[tokio::test]
    async fn test_join_missing_lobby() {
        // テスト項目: 存在しないロビーへの参加は LobbyNotFound になる
        // given (前提条件):
        let harness = Harness::conditional();
        let usecase = JoinLobbyUseCase::new(harness.coordinator.clone());
        let code = RoomCode::new("NOPE99".to_string()).unwrap();

        // when (操作):
        let result = usecase.execute(&code, player("bob")).await;

        // then (期待する結果):
        assert_eq!(result, Err(LobbyError::LobbyNotFound("NOPE99".to_string())));
    }

    #[tokio::test]
    async fn test_lost_queueing_race_is_retryable_not_full() {
        // テスト項目: 待機リスト有効時に競合で負け続けても LobbyFull ではなく再試行可能なエラーになる
        // given (前提条件): 満員の SINGLES、書き込みは毎回事前条件で負ける
        let lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        let document = encode_lobby(&lobby).unwrap();
        let mut store = MockSharedLobbyStore::new();
        store.expect_capabilities().returning(|| StoreCapabilities {
            conditional_writes: true,
        });
        store
            .expect_fetch_document()
            .times(7)
            .returning(move |_| Ok(document.clone()));
        store
            .expect_update_fields()
            .times(6)
            .returning(|_, _| Err(StoreError::PreconditionFailed("waitingPlayers".to_string())));
        let config = CoordinatorConfig {
            retry: RetryPolicy {
                max_attempts: 2,
                ..fast_config().retry
            },
            join_rounds: 3,
            ..fast_config()
        };
        let coordinator = LobbyCoordinator::new(
            Arc::new(store),
            Arc::new(ManualClock::new(START)),
            config,
        );
        let usecase = JoinLobbyUseCase::new(Arc::new(coordinator));

        // when (操作):
        let result = usecase.execute(&lobby.room_code, player("carol")).await;

        // then (期待する結果): 2 回 × 3 ラウンド試した後に ConcurrencyLost
        let error = result.unwrap_err();
        assert_eq!(
            error,
            LobbyError::ConcurrencyLost {
                operation: "join the lobby",
                attempts: 2,
            }
        );
        assert!(error.is_retryable());
    }
}
