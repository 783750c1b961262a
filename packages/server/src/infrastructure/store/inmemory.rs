//! InMemory SharedLobbyStore 実装
//!
//! ドメイン層が定義する SharedLobbyStore trait の具体的な実装。
//! room code をキーにした HashMap をインメモリの文書ストアとして使用します。
//!
//! ## 購読
//!
//! 文書ごとに `tokio::sync::watch` チャネルを持ち、書き込みのたびに最新の
//! 文書を送ります。削除時は `None` を送ってからチャネルを破棄します。
//!
//! ## 事前条件
//!
//! `conditional()` で作成したストアは事前条件を書き込みと同じロックの中で
//! 評価します。`last_write_wins()` で作成したストアは事前条件を無視し、
//! フィールド単位の後勝ちだけを保証する実ストアの振る舞いを再現します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};

use crate::domain::{
    Document, DocumentSubscription, FieldUpdate, RoomCode, SharedLobbyStore, StoreCapabilities,
    StoreError,
};

/// インメモリ SharedLobbyStore 実装
#[derive(Clone)]
pub struct InMemoryLobbyStore {
    /// Key: room code, Value: 最新の文書を配信する watch sender
    documents: Arc<Mutex<HashMap<String, watch::Sender<Option<Document>>>>>,
    capabilities: StoreCapabilities,
}

impl InMemoryLobbyStore {
    /// 事前条件を評価するストアを作成
    pub fn conditional() -> Self {
        Self::with_capabilities(StoreCapabilities {
            conditional_writes: true,
        })
    }

    /// 事前条件を無視する（後勝ち）ストアを作成
    pub fn last_write_wins() -> Self {
        Self::with_capabilities(StoreCapabilities {
            conditional_writes: false,
        })
    }

    pub fn with_capabilities(capabilities: StoreCapabilities) -> Self {
        Self {
            documents: Arc::new(Mutex::new(HashMap::new())),
            capabilities,
        }
    }

    /// 保持している文書数
    pub async fn len(&self) -> usize {
        let documents = self.documents.lock().await;
        documents
            .values()
            .filter(|sender| sender.borrow().is_some())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryLobbyStore {
    fn default() -> Self {
        Self::conditional()
    }
}

#[async_trait]
impl SharedLobbyStore for InMemoryLobbyStore {
    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    async fn create_document(
        &self,
        room_code: &RoomCode,
        document: Document,
    ) -> Result<(), StoreError> {
        if !document.is_object() {
            return Err(StoreError::Malformed(format!(
                "document for '{}' is not an object",
                room_code
            )));
        }

        let mut documents = self.documents.lock().await;
        if let Some(sender) = documents.get(room_code.as_str())
            && sender.borrow().is_some()
        {
            return Err(StoreError::AlreadyExists(room_code.to_string()));
        }

        let (sender, _) = watch::channel(Some(document));
        documents.insert(room_code.as_str().to_string(), sender);
        tracing::debug!("Created document '{}'", room_code);
        Ok(())
    }

    async fn fetch_document(&self, room_code: &RoomCode) -> Result<Document, StoreError> {
        let documents = self.documents.lock().await;
        documents
            .get(room_code.as_str())
            .and_then(|sender| sender.borrow().clone())
            .ok_or_else(|| StoreError::NotFound(room_code.to_string()))
    }

    async fn subscribe_document(
        &self,
        room_code: &RoomCode,
    ) -> Result<DocumentSubscription, StoreError> {
        let documents = self.documents.lock().await;
        match documents.get(room_code.as_str()) {
            Some(sender) if sender.borrow().is_some() => {
                tracing::debug!("New subscriber for document '{}'", room_code);
                Ok(sender.subscribe())
            }
            _ => Err(StoreError::NotFound(room_code.to_string())),
        }
    }

    async fn update_fields(
        &self,
        room_code: &RoomCode,
        update: FieldUpdate,
    ) -> Result<(), StoreError> {
        let documents = self.documents.lock().await;
        let sender = documents
            .get(room_code.as_str())
            .ok_or_else(|| StoreError::NotFound(room_code.to_string()))?;
        let Some(mut document) = sender.borrow().clone() else {
            return Err(StoreError::NotFound(room_code.to_string()));
        };

        if self.capabilities.conditional_writes
            && let Some(failed) = update.failed_precondition(&document)
        {
            tracing::debug!(
                "Rejected update on '{}': precondition on '{}' does not hold",
                room_code,
                failed.path
            );
            return Err(StoreError::PreconditionFailed(failed.path.to_string()));
        }

        update.apply_to(&mut document)?;
        sender.send_replace(Some(document));
        tracing::debug!(
            "Updated {} field(s) of document '{}'",
            update.writes.len(),
            room_code
        );
        Ok(())
    }

    async fn delete_document(&self, room_code: &RoomCode) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().await;
        let sender = documents
            .remove(room_code.as_str())
            .ok_or_else(|| StoreError::NotFound(room_code.to_string()))?;
        sender.send_replace(None);
        tracing::debug!("Deleted document '{}'", room_code);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldPath, FieldWrite, Precondition};
    use serde_json::{Value, json};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 文書の作成・取得・更新・削除
    // - 事前条件の評価（conditional）と無視（last-write-wins）
    // - 購読者への変更通知と削除通知
    //
    // 【なぜこのテストが必要か】
    // - コーディネーターの競合解決はストアの事前条件の振る舞いに依存する
    // - 統合テストで使うため、実ストアの保証を正しく再現している必要がある
    // ========================================

    fn code() -> RoomCode {
        RoomCode::new("ABCD12".to_string()).unwrap()
    }

    fn claim_slot(player: &str) -> FieldUpdate {
        FieldUpdate {
            writes: vec![FieldWrite {
                path: FieldPath::new("teams.team1.slot2"),
                value: json!({ "playerId": player }),
            }],
            preconditions: vec![Precondition::equals(
                FieldPath::new("teams.team1.slot2"),
                Value::Null,
            )],
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_room_code() {
        // テスト項目: 同じ room code の文書は作成できない
        // given (前提条件):
        let store = InMemoryLobbyStore::conditional();
        store.create_document(&code(), json!({})).await.unwrap();

        // when (操作):
        let result = store.create_document(&code(), json!({})).await;

        // then (期待する結果):
        assert_eq!(result, Err(StoreError::AlreadyExists("ABCD12".to_string())));
    }

    #[tokio::test]
    async fn test_conditional_store_rejects_failed_precondition() {
        // テスト項目: conditional ストアでは事前条件が崩れた書き込みが拒否される
        // given (前提条件):
        let store = InMemoryLobbyStore::conditional();
        store
            .create_document(&code(), json!({ "teams": { "team1": { "slot2": null } } }))
            .await
            .unwrap();

        // when (操作):
        let first = store.update_fields(&code(), claim_slot("bob")).await;
        let second = store.update_fields(&code(), claim_slot("carol")).await;

        // then (期待する結果):
        assert!(first.is_ok());
        assert_eq!(
            second,
            Err(StoreError::PreconditionFailed("teams.team1.slot2".to_string()))
        );
        let document = store.fetch_document(&code()).await.unwrap();
        assert_eq!(document["teams"]["team1"]["slot2"]["playerId"], "bob");
    }

    #[tokio::test]
    async fn test_last_write_wins_store_ignores_preconditions() {
        // テスト項目: last-write-wins ストアでは事前条件が無視され後勝ちになる
        // given (前提条件):
        let store = InMemoryLobbyStore::last_write_wins();
        store.create_document(&code(), json!({})).await.unwrap();

        // when (操作):
        store.update_fields(&code(), claim_slot("bob")).await.unwrap();
        store.update_fields(&code(), claim_slot("carol")).await.unwrap();

        // then (期待する結果):
        let document = store.fetch_document(&code()).await.unwrap();
        assert_eq!(document["teams"]["team1"]["slot2"]["playerId"], "carol");
    }

    #[tokio::test]
    async fn test_subscribers_observe_updates_and_deletion() {
        // テスト項目: 購読者は更新と削除（None）を観測できる
        // given (前提条件):
        let store = InMemoryLobbyStore::conditional();
        store.create_document(&code(), json!({})).await.unwrap();
        let mut subscription = store.subscribe_document(&code()).await.unwrap();

        // when (操作):
        store.update_fields(&code(), claim_slot("bob")).await.unwrap();
        subscription.changed().await.unwrap();
        let updated = subscription.borrow_and_update().clone();
        store.delete_document(&code()).await.unwrap();
        subscription.changed().await.unwrap();
        let deleted = subscription.borrow_and_update().clone();

        // then (期待する結果):
        assert_eq!(
            updated.unwrap()["teams"]["team1"]["slot2"]["playerId"],
            "bob"
        );
        assert_eq!(deleted, None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        // テスト項目: 存在しない文書の操作は NotFound になる
        // given (前提条件):
        let store = InMemoryLobbyStore::conditional();

        // when (操作):
        let fetched = store.fetch_document(&code()).await;
        let updated = store.update_fields(&code(), claim_slot("bob")).await;
        let subscribed = store.subscribe_document(&code()).await;
        let deleted = store.delete_document(&code()).await;

        // then (期待する結果):
        assert!(matches!(fetched, Err(StoreError::NotFound(_))));
        assert!(matches!(updated, Err(StoreError::NotFound(_))));
        assert!(matches!(subscribed, Err(StoreError::NotFound(_))));
        assert!(matches!(deleted, Err(StoreError::NotFound(_))));
    }
}
