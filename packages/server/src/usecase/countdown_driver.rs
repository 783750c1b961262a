//! CountdownDriver: カウントダウンのタイミングループ
//!
//! ロビーを購読しながら、各ティックの待ち時間が過ぎるごとに
//! `AdvanceCountdownUseCase` で 1 段階ずつ進め、IN_PROGRESS になったら終了します。
//!
//! - ホストは `CountdownTimings` の待ち時間で進める
//! - 着席している参加者は `stall_takeover_after` だけ待ち、ホストが止まって
//!   いれば引き継いで進める（ホストが進めれば購読で追従するだけ）

use std::sync::Arc;

use tokio::time::{Instant, sleep_until};

use crate::domain::{LifecycleState, Lobby, LobbyError, PlayerId, RoomCode};

use super::{
    advance_countdown::AdvanceCountdownUseCase,
    coordinator::LobbyCoordinator,
    watch_lobby::{LobbyUpdate, WatchLobbyUseCase},
};

pub struct CountdownDriver {
    coordinator: Arc<LobbyCoordinator>,
    advance: AdvanceCountdownUseCase,
}

impl CountdownDriver {
    pub fn new(coordinator: Arc<LobbyCoordinator>) -> Self {
        Self {
            advance: AdvanceCountdownUseCase::new(coordinator.clone()),
            coordinator,
        }
    }

    /// Drive the countdown of `room_code` until the match is running.
    ///
    /// # Returns
    ///
    /// * `Ok(Lobby)` - IN_PROGRESS のロビー
    /// * `Err(LobbyError::IllegalTransition)` - カウントダウン中でない（キャンセルを含む）
    /// * `Err(LobbyError::LobbyNotFound)` - 途中でロビーが削除された
    pub async fn run(&self, room_code: &RoomCode, actor: &PlayerId) -> Result<Lobby, LobbyError> {
        let mut watch = WatchLobbyUseCase::new(self.coordinator.clone())
            .execute(room_code)
            .await?;
        let mut lobby = match watch.current()? {
            LobbyUpdate::Changed(lobby) => lobby,
            LobbyUpdate::Deleted => return Err(LobbyError::LobbyNotFound(room_code.to_string())),
        };
        let mut deadline = Instant::now() + self.wait_for(&lobby, actor);

        loop {
            let tick = match lobby.state {
                LifecycleState::InProgress => return Ok(lobby),
                LifecycleState::Countdown(tick) => tick,
                state => {
                    return Err(LobbyError::IllegalTransition {
                        action: "drive the countdown",
                        state,
                        detail: "no countdown is running".to_string(),
                    });
                }
            };

            let seen = lobby.state;
            tokio::select! {
                _ = sleep_until(deadline) => {
                    match self.advance.execute(room_code, actor, tick).await {
                        Ok(outcome) => lobby = outcome.into_lobby(),
                        // The host is still active; keep following
                        Err(LobbyError::Unauthorized { .. }) => {
                            lobby = self.coordinator.load(room_code).await?;
                            if lobby.state == seen {
                                deadline = Instant::now() + self.wait_for(&lobby, actor);
                            }
                        }
                        Err(e) => return Err(e),
                    }
                }
                update = watch.next() => match update {
                    Some(LobbyUpdate::Changed(fresh)) => lobby = fresh,
                    Some(LobbyUpdate::Deleted) | None => {
                        return Err(LobbyError::LobbyNotFound(room_code.to_string()));
                    }
                },
            }

            if lobby.state != seen {
                deadline = Instant::now() + self.wait_for(&lobby, actor);
            }
        }
    }

    fn wait_for(&self, lobby: &Lobby, actor: &PlayerId) -> std::time::Duration {
        let config = self.coordinator.config();
        match lobby.state.countdown_tick() {
            Some(tick) if lobby.is_host(actor) => config.countdown.delay(tick),
            _ => config.stall_takeover_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{CountdownTick, GameMode, Timestamp, entity::fixtures::*},
        infrastructure::store::InMemoryLobbyStore,
        usecase::{
            CancelMatchUseCase, CoordinatorConfig, StartCountdownUseCase,
            coordinator::test_support::*,
        },
    };
    use std::time::Duration;

    #[tokio::test]
    async fn test_host_drives_countdown_to_in_progress() {
        // テスト項目: ホストのドライバーは開始から IN_PROGRESS まで進める
        // given (前提条件):
        let harness = Harness::conditional();
        let lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        harness.put(&lobby).await;
        StartCountdownUseCase::new(harness.coordinator.clone())
            .execute(&lobby.room_code, &player_id("alice"))
            .await
            .unwrap();
        let driver = CountdownDriver::new(harness.coordinator.clone());

        // when (操作):
        let running = driver
            .run(&lobby.room_code, &player_id("alice"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(running.state, LifecycleState::InProgress);
        assert_eq!(running.started_at, Some(Timestamp::new(START)));
        assert_eq!(harness.get(&lobby).await, running);
    }

    #[tokio::test]
    async fn test_follower_tracks_host_to_in_progress() {
        // テスト項目: ゲストのドライバーはホストの進行に追従し、同じ結果で終わる
        // given (前提条件):
        let harness = Harness::conditional();
        let lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        harness.put(&lobby).await;
        StartCountdownUseCase::new(harness.coordinator.clone())
            .execute(&lobby.room_code, &player_id("alice"))
            .await
            .unwrap();
        let guest = CountdownDriver::new(harness.coordinator.clone());
        let host = CountdownDriver::new(harness.coordinator.clone());

        // when (操作):
        let bob = player_id("bob");
        let alice = player_id("alice");
        let (guest_view, host_view) = tokio::join!(
            guest.run(&lobby.room_code, &bob),
            host.run(&lobby.room_code, &alice),
        );

        // then (期待する結果):
        assert_eq!(guest_view.unwrap().state, LifecycleState::InProgress);
        assert_eq!(host_view.unwrap().state, LifecycleState::InProgress);
    }

    #[tokio::test]
    async fn test_follower_takes_over_abandoned_countdown() {
        // テスト項目: ホストが止まったカウントダウンは着席者のドライバーが完走させる
        // given (前提条件): ホストは COUNTDOWN(START) で止まっている
        let config = CoordinatorConfig {
            stall_takeover_after: Duration::from_millis(10),
            ..fast_config()
        };
        let harness = Harness::new(InMemoryLobbyStore::conditional(), config);
        let mut lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        lobby.state = LifecycleState::Countdown(CountdownTick::Start);
        lobby.last_activity_at = Timestamp::new(START);
        harness.put(&lobby).await;
        harness.clock.advance(1_000);
        let driver = CountdownDriver::new(harness.coordinator.clone());

        // when (操作):
        let running = driver.run(&lobby.room_code, &player_id("bob")).await.unwrap();

        // then (期待する結果):
        assert_eq!(running.state, LifecycleState::InProgress);
    }

    #[tokio::test]
    async fn test_cancel_stops_the_driver() {
        // テスト項目: カウントダウン中にキャンセルされるとドライバーはエラーで終わる
        // given (前提条件): ゲストはホストを待っている
        let harness = Harness::conditional();
        let mut lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        lobby.state = LifecycleState::Countdown(CountdownTick::Zero);
        harness.put(&lobby).await;
        let driver = CountdownDriver::new(harness.coordinator.clone());
        let cancel = CancelMatchUseCase::new(harness.coordinator.clone());

        // when (操作):
        let bob = player_id("bob");
        let (result, _) = tokio::join!(driver.run(&lobby.room_code, &bob), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel
                .execute(&lobby.room_code, &player_id("alice"), None)
                .await
                .unwrap();
        });

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(LobbyError::IllegalTransition {
                state: LifecycleState::Cancelled,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_driver_refuses_open_lobby() {
        // テスト項目: カウントダウンが始まっていないロビーは駆動できない
        // given (前提条件):
        let harness = Harness::conditional();
        let lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        harness.put(&lobby).await;
        let driver = CountdownDriver::new(harness.coordinator.clone());

        // when (操作):
        let result = driver.run(&lobby.room_code, &player_id("alice")).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(LobbyError::IllegalTransition {
                action: "drive the countdown",
                ..
            })
        ));
    }
}
