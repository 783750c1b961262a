//! UseCase: ロビー削除（ホストのみ）

use std::sync::Arc;

use crate::domain::{LobbyError, PlayerId, RoomCode, state_machine};

use super::coordinator::{LobbyCoordinator, store_error};

/// ロビー削除のユースケース
pub struct DeleteLobbyUseCase {
    coordinator: Arc<LobbyCoordinator>,
}

impl DeleteLobbyUseCase {
    pub fn new(coordinator: Arc<LobbyCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn execute(&self, room_code: &RoomCode, actor: &PlayerId) -> Result<(), LobbyError> {
        let lobby = self.coordinator.load(room_code).await?;
        state_machine::ensure_host(&lobby, actor, "delete the lobby")?;

        let store = self.coordinator.store().as_ref();
        self.coordinator
            .call_store(move || store.delete_document(room_code))
            .await
            .map_err(|e| store_error(room_code, e))?;

        tracing::info!("Lobby {} deleted by '{}'", room_code, actor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{GameMode, SharedLobbyStore, entity::fixtures::*},
        usecase::coordinator::test_support::*,
    };

    #[tokio::test]
    async fn test_host_deletes_lobby_and_subscribers_see_it_gone() {
        // テスト項目: ホストが削除すると文書が消え、購読者は None を受け取る
        // given (前提条件):
        let harness = Harness::conditional();
        let lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        harness.put(&lobby).await;
        let mut subscription = harness
            .store
            .subscribe_document(&lobby.room_code)
            .await
            .unwrap();
        let usecase = DeleteLobbyUseCase::new(harness.coordinator.clone());

        // when (操作):
        usecase
            .execute(&lobby.room_code, &player_id("alice"))
            .await
            .unwrap();

        // then (期待する結果):
        subscription.changed().await.unwrap();
        assert!(subscription.borrow().is_none());
        assert_eq!(
            harness.coordinator.load(&lobby.room_code).await,
            Err(LobbyError::LobbyNotFound("TEST42".to_string()))
        );
    }

    #[tokio::test]
    async fn test_guest_cannot_delete() {
        // テスト項目: ホスト以外は削除できない
        // given (前提条件):
        let harness = Harness::conditional();
        let lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        harness.put(&lobby).await;
        let usecase = DeleteLobbyUseCase::new(harness.coordinator.clone());

        // when (操作):
        let result = usecase.execute(&lobby.room_code, &player_id("bob")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(LobbyError::Unauthorized { .. })));
        assert_eq!(harness.get(&lobby).await, lobby);
    }
}
