//! UseCase: ロビー作成
//!
//! room code を生成し、ホストを team1.slot1 に座らせた OPEN のロビー文書を
//! 作成します。room code が衝突した場合は別のコードで作り直します。

use std::sync::Arc;

use crate::{
    domain::{GameMode, Lobby, LobbyError, PlayerSnapshot, RoomCode, RoomCodeFactory, StoreError},
    infrastructure::dto::encode_lobby,
};

use super::coordinator::{LobbyCoordinator, store_error};

/// Room code source, swappable for deterministic tests
pub type CodeGenerator = Box<dyn Fn() -> RoomCode + Send + Sync>;

/// ロビー作成のユースケース
pub struct CreateLobbyUseCase {
    coordinator: Arc<LobbyCoordinator>,
    generate_code: CodeGenerator,
}

impl CreateLobbyUseCase {
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

    /// ロビーを作成
    ///
    /// # Returns
    ///
    /// * `Ok(Lobby)` - 作成されたロビー
    /// * `Err(LobbyError::ConcurrencyLost)` - room code の衝突が続いた
    pub async fn execute(
        &self,
        host: PlayerSnapshot,
        game_mode: GameMode,
    ) -> Result<Lobby, LobbyError> {
        if host.display_name.trim().is_empty() {
            return Err(LobbyError::InvalidRequest(
                "display name must not be empty".to_string(),
            ));
        }
        create_with_fresh_code(&self.coordinator, &self.generate_code, |room_code, now| {
            Lobby::new(room_code, host.clone(), game_mode, now)
        })
        .await
    }
}

/// Create the lobby built by `build`, drawing a new room code on every collision
pub(crate) async fn create_with_fresh_code<F>(
    coordinator: &LobbyCoordinator,
    generate_code: &CodeGenerator,
    mut build: F,
) -> Result<Lobby, LobbyError>
where
    F: FnMut(RoomCode, crate::domain::Timestamp) -> Lobby,
{
    let max_attempts = coordinator.config().retry.max_attempts.max(1);
    let store = coordinator.store().as_ref();

    for attempt in 1..=max_attempts {
        let lobby = build(generate_code(), coordinator.now());
        let document = encode_lobby(&lobby)?;
        let room_code = &lobby.room_code;
        let document = &document;

        match coordinator
            .call_store(move || store.create_document(room_code, document.clone()))
            .await
        {
            Ok(()) => {
                tracing::info!(
                    "Lobby {} ({}) created by '{}'",
                    lobby.room_code,
                    lobby.game_mode,
                    lobby.host_id
                );
                return Ok(lobby);
            }
            Err(StoreError::AlreadyExists(code)) => {
                tracing::warn!(
                    "Room code {} is taken (attempt {}/{}), drawing another",
                    code,
                    attempt,
                    max_attempts
                );
            }
            Err(e) => return Err(store_error(&lobby.room_code, e)),
        }
    }

    Err(LobbyError::ConcurrencyLost {
        operation: "create a lobby",
        attempts: max_attempts,
    })
}
