//! LobbyCoordinator: 共有ストアに対する楽観的並行制御
//!
//! 各ユースケースはロビーへの変更を「判断関数」として渡し、コーディネーターが
//! 以下のループを回します。
//!
//! ```text
//! fetch → decode → decide → commit ──landed──▶ Ok
//!   ▲                          │
//!   └────── lost (re-decide) ◀─┘   (max_attempts まで、超えたら ConcurrencyLost)
//! ```
//!
//! - 事前条件をサポートするストアでは、判断の前提（ガード）を事前条件として
//!   書き込みと同時に評価させる
//! - 事前条件をサポートしないストアでは、書き込み後に読み直して判断に関わる
//!   変更が残っているかを確認する（`lastActivityAt` は確認対象外）
//! - `StoreUnavailable` は指数バックオフで再試行し、上限を超えたら呼び出し元へ返す

use std::{future::Future, sync::Arc, time::Duration};

use courtlobby_shared::time::Clock;

use crate::{
    domain::{
        CountdownTimings, Lobby, LobbyError, LobbyPatch, Plan, RoomCode, SharedLobbyStore,
        StoreError, SwapPolicy, Timestamp,
    },
    infrastructure::dto::{decode_lobby, encode_patch},
};

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per operation, counting the first one
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff_base: Duration::from_millis(50),
            backoff_cap: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): base, 2×base, 4×base, ... capped
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_base
            .checked_mul(factor)
            .map_or(self.backoff_cap, |delay| delay.min(self.backoff_cap))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub retry: RetryPolicy,
    pub swap_policy: SwapPolicy,
    pub countdown: CountdownTimings,
    /// Idle time after which a seated player may advance the countdown
    pub stall_takeover_after: Duration,
    /// Route joiners of a full lobby to the waiting list instead of failing
    pub waiting_list: bool,
    /// Rounds of `retry.max_attempts` a joiner spends queueing before it
    /// reports a lost race (only used with the waiting list)
    pub join_rounds: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            swap_policy: SwapPolicy::default(),
            countdown: CountdownTimings::default(),
            stall_takeover_after: Duration::from_secs(5),
            waiting_list: true,
            join_rounds: 8,
        }
    }
}

/// Outcome of a mutation together with the lobby it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    pub outcome: T,
    pub lobby: Lobby,
}

enum Commit {
    Landed(Lobby),
    Lost,
}

pub struct LobbyCoordinator {
    /// SharedLobbyStore（共有文書ストアの抽象化）
    store: Arc<dyn SharedLobbyStore>,
    clock: Arc<dyn Clock>,
    config: CoordinatorConfig,
}

impl LobbyCoordinator {
    pub fn new(
        store: Arc<dyn SharedLobbyStore>,
        clock: Arc<dyn Clock>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn SharedLobbyStore> {
        &self.store
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// Fetch and validate the current lobby
    pub async fn load(&self, room_code: &RoomCode) -> Result<Lobby, LobbyError> {
        let store = self.store.as_ref();
        let document = self
            .call_store(move || store.fetch_document(room_code))
            .await
            .map_err(|e| store_error(room_code, e))?;
        decode_lobby(room_code, &document).inspect_err(|e| {
            tracing::warn!("Rejected snapshot of lobby {}: {}", room_code, e);
        })
    }

    /// Run the optimistic mutation loop for one operation.
    ///
    /// `decide` is called with a fresh snapshot on every attempt and must be
    /// free of side effects; it may be called up to `max_attempts` times.
    pub async fn mutate<T, F>(
        &self,
        room_code: &RoomCode,
        operation: &'static str,
        mut decide: F,
    ) -> Result<Committed<T>, LobbyError>
    where
        F: FnMut(&Lobby, Timestamp) -> Result<Plan<T>, LobbyError>,
    {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let lobby = self.load(room_code).await?;
            let (patch, outcome) = match decide(&lobby, self.now())? {
                Plan::Noop(outcome) => return Ok(Committed { outcome, lobby }),
                Plan::Apply { patch, outcome } => (patch, outcome),
            };

            match self.commit(room_code, &lobby, &patch).await? {
                Commit::Landed(lobby) => return Ok(Committed { outcome, lobby }),
                Commit::Lost if attempt >= max_attempts => {
                    tracing::warn!(
                        "Gave up trying to {} in lobby {} after {} attempts",
                        operation,
                        room_code,
                        attempt
                    );
                    return Err(LobbyError::ConcurrencyLost {
                        operation,
                        attempts: attempt,
                    });
                }
                Commit::Lost => {
                    tracing::warn!(
                        "Lost the race to {} in lobby {} (attempt {}/{}), re-deciding",
                        operation,
                        room_code,
                        attempt,
                        max_attempts
                    );
                }
            }
        }
    }

    async fn commit(
        &self,
        room_code: &RoomCode,
        seen: &Lobby,
        patch: &LobbyPatch,
    ) -> Result<Commit, LobbyError> {
        let store = self.store.as_ref();

        if store.capabilities().conditional_writes {
            let update = encode_patch(patch)?;
            let update = &update;
            return match self
                .call_store(move || store.update_fields(room_code, update.clone()))
                .await
            {
                Ok(()) => Ok(Commit::Landed(patch.apply(seen))),
                Err(StoreError::PreconditionFailed(field)) => {
                    tracing::debug!("Precondition on '{}' failed for lobby {}", field, room_code);
                    Ok(Commit::Lost)
                }
                Err(e) => Err(store_error(room_code, e)),
            };
        }

        let update = encode_patch(patch)?.without_preconditions();
        let update = &update;
        self.call_store(move || store.update_fields(room_code, update.clone()))
            .await
            .map_err(|e| store_error(room_code, e))?;

        let fresh = self.load(room_code).await?;
        if patch.landed_in(&fresh) {
            Ok(Commit::Landed(fresh))
        } else {
            tracing::debug!("Write to lobby {} was overwritten before verification", room_code);
            Ok(Commit::Lost)
        }
    }

    /// Call the store, retrying `Unavailable` with exponential backoff
    pub(crate) async fn call_store<T, F, Fut>(&self, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let retry = self.config.retry;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match call().await {
                Err(StoreError::Unavailable(reason)) if attempt < retry.max_attempts => {
                    let delay = retry.backoff(attempt);
                    tracing::warn!(
                        "Store unavailable ({}), retrying in {:?} (attempt {}/{})",
                        reason,
                        delay,
                        attempt,
                        retry.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

/// Map a store failure onto the lobby error taxonomy
pub(crate) fn store_error(room_code: &RoomCode, error: StoreError) -> LobbyError {
    match error {
        StoreError::NotFound(_) => LobbyError::LobbyNotFound(room_code.to_string()),
        StoreError::Unavailable(reason) => LobbyError::StoreUnavailable(reason),
        StoreError::Malformed(detail) => LobbyError::CorruptSnapshot(detail),
        StoreError::AlreadyExists(code) => {
            LobbyError::InvalidRequest(format!("lobby {} already exists", code))
        }
        StoreError::PreconditionFailed(_) => LobbyError::ConcurrencyLost {
            operation: "update the lobby",
            attempts: 1,
        },
    }
}
