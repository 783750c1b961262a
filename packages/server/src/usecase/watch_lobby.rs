//! UseCase: ロビー購読
//!
//! ストアのスナップショット購読をドメインの `Lobby` に変換します。
//! 壊れたスナップショットは警告を出して読み飛ばし、削除は `LobbyUpdate::Deleted`
//! として通知します。

use std::sync::Arc;

use crate::{
    domain::{Document, DocumentSubscription, Lobby, LobbyError, RoomCode},
    infrastructure::dto::decode_lobby,
};

use super::coordinator::{LobbyCoordinator, store_error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyUpdate {
    Changed(Lobby),
    Deleted,
}

/// Live view of one lobby document
pub struct LobbyWatch {
    room_code: RoomCode,
    subscription: DocumentSubscription,
}

impl LobbyWatch {
    pub fn new(room_code: RoomCode, subscription: DocumentSubscription) -> Self {
        Self {
            room_code,
            subscription,
        }
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    /// Decode the latest snapshot and mark it as seen
    pub fn current(&mut self) -> Result<LobbyUpdate, LobbyError> {
        let snapshot = self.subscription.borrow_and_update().clone();
        self.decode(snapshot)
    }

    /// Wait for the next valid snapshot.
    ///
    /// Returns `None` once the store closes the subscription.
    pub async fn next(&mut self) -> Option<LobbyUpdate> {
        loop {
            self.subscription.changed().await.ok()?;
            let snapshot = self.subscription.borrow_and_update().clone();
            match self.decode(snapshot) {
                Ok(update) => return Some(update),
                Err(e) => {
                    tracing::warn!("Skipping snapshot of lobby {}: {}", self.room_code, e);
                }
            }
        }
    }

    fn decode(&self, snapshot: Option<Document>) -> Result<LobbyUpdate, LobbyError> {
        match snapshot {
            None => Ok(LobbyUpdate::Deleted),
            Some(document) => decode_lobby(&self.room_code, &document).map(LobbyUpdate::Changed),
        }
    }
}

/// ロビー購読のユースケース
pub struct WatchLobbyUseCase {
    coordinator: Arc<LobbyCoordinator>,
}

impl WatchLobbyUseCase {
    pub fn new(coordinator: Arc<LobbyCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn execute(&self, room_code: &RoomCode) -> Result<LobbyWatch, LobbyError> {
        let store = self.coordinator.store().as_ref();
        let subscription = self
            .coordinator
            .call_store(move || store.subscribe_document(room_code))
            .await
            .map_err(|e| store_error(room_code, e))?;
        tracing::debug!("Watching lobby {}", room_code);
        Ok(LobbyWatch::new(room_code.clone(), subscription))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            FieldPath, FieldUpdate, FieldWrite, GameMode, SharedLobbyStore, entity::fixtures::*,
        },
        usecase::{JoinLobbyUseCase, coordinator::test_support::*},
    };
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_watch_sees_joins_and_deletion() {
        // テスト項目: 参加は Changed、削除は Deleted として届く
        // given (前提条件):
        let harness = Harness::conditional();
        let lobby = lobby(GameMode::Singles, "alice");
        harness.put(&lobby).await;
        let mut watch = WatchLobbyUseCase::new(harness.coordinator.clone())
            .execute(&lobby.room_code)
            .await
            .unwrap();
        assert_eq!(watch.current().unwrap(), LobbyUpdate::Changed(lobby.clone()));

        // when (操作):
        JoinLobbyUseCase::new(harness.coordinator.clone())
            .execute(&lobby.room_code, player("bob"))
            .await
            .unwrap();
        let joined = watch.next().await;
        harness.store.delete_document(&lobby.room_code).await.unwrap();
        let deleted = watch.next().await;

        // then (期待する結果):
        let Some(LobbyUpdate::Changed(joined)) = joined else {
            panic!("expected a lobby snapshot");
        };
        assert_eq!(joined.occupancy(), 2);
        assert_eq!(deleted, Some(LobbyUpdate::Deleted));
        assert_eq!(watch.next().await, None);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_skipped() {
        // テスト項目: 壊れたスナップショットは読み飛ばされ、次の正しい状態が届く
        // given (前提条件):
        let harness = Harness::conditional();
        let lobby = lobby(GameMode::Singles, "alice");
        harness.put(&lobby).await;
        let mut watch = WatchLobbyUseCase::new(harness.coordinator.clone())
            .execute(&lobby.room_code)
            .await
            .unwrap();
        let write = |value| FieldUpdate {
            writes: vec![FieldWrite {
                path: FieldPath::new("gameMode"),
                value,
            }],
            preconditions: Vec::new(),
        };

        // when (操作): gameMode を壊してから直す
        harness
            .store
            .update_fields(&lobby.room_code, write(json!("TRIPLES")))
            .await
            .unwrap();
        let skipped = tokio::time::timeout(Duration::from_millis(20), watch.next()).await;
        harness
            .store
            .update_fields(&lobby.room_code, write(json!("SINGLES")))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(skipped.is_err(), "corrupt snapshot must not be delivered");
        assert_eq!(watch.next().await, Some(LobbyUpdate::Changed(lobby)));
    }

    #[tokio::test]
    async fn test_watch_missing_lobby() {
        // テスト項目: 存在しないロビーは購読できない
        // given (前提条件):
        let harness = Harness::conditional();
        let usecase = WatchLobbyUseCase::new(harness.coordinator.clone());

        // when (操作):
        let result = usecase
            .execute(&RoomCode::new("NOPE42".to_string()).unwrap())
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(LobbyError::LobbyNotFound(_))));
    }
}
