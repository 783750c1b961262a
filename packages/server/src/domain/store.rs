//! SharedLobbyStore trait 定義
//!
//! ロビー文書を保持する外部のリアルタイム文書ストアの最小契約。
//! 具体的な実装は Infrastructure 層（InMemory）とクライアント（HTTP）が提供します。
//!
//! ## 前提とする保証
//!
//! - 1 フィールドの更新はアトミック、全購読者は最終的に同じ値を観測する
//! - 複数フィールドの同時更新がアトミックに観測される保証はない
//! - フィールド単位の事前条件（precondition）は `capabilities()` が
//!   `conditional_writes = true` を返すストアでのみ評価される
//!
//! 文書は Firestore 風のネストした JSON で、`teams.team1.slot1` のような
//! ドット区切りのパスでフィールドを指定します。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::watch;

use super::{error::StoreError, value_object::RoomCode};

/// Raw lobby document as stored
pub type Document = Value;

/// Live view of one document; `None` once the document is deleted
pub type DocumentSubscription = watch::Receiver<Option<Document>>;

/// Dotted path to a field inside a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Value at this path, `None` when any segment is missing
    pub fn lookup<'a>(&self, document: &'a Document) -> Option<&'a Value> {
        self.segments()
            .try_fold(document, |value, segment| value.as_object()?.get(segment))
    }

    /// Set the value at this path, creating intermediate objects
    pub fn assign(&self, document: &mut Document, value: Value) -> Result<(), StoreError> {
        let segments: Vec<&str> = self.segments().collect();
        let Some((last, parents)) = segments.split_last() else {
            return Err(StoreError::Malformed("empty field path".to_string()));
        };

        let mut cursor = document;
        for segment in parents {
            let object = cursor.as_object_mut().ok_or_else(|| {
                StoreError::Malformed(format!("'{}' crosses a non-object value", self.0))
            })?;
            cursor = object
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        let object = cursor.as_object_mut().ok_or_else(|| {
            StoreError::Malformed(format!("'{}' crosses a non-object value", self.0))
        })?;
        object.insert(last.to_string(), value);
        Ok(())
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One field assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldWrite {
    pub path: FieldPath,
    pub value: Value,
}

/// What a precondition expects of a field's current value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Expectation {
    /// Field equals the value; `Equals(null)` also matches a missing field
    Equals(Value),
    /// Field exists and is not null
    Present,
}

/// Condition that must hold at write time for an update to apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Precondition {
    pub path: FieldPath,
    pub expect: Expectation,
}

impl Precondition {
    pub fn equals(path: FieldPath, value: Value) -> Self {
        Self {
            path,
            expect: Expectation::Equals(value),
        }
    }

    pub fn present(path: FieldPath) -> Self {
        Self {
            path,
            expect: Expectation::Present,
        }
    }

    pub fn holds(&self, document: &Document) -> bool {
        let current = self.path.lookup(document).unwrap_or(&Value::Null);
        match &self.expect {
            Expectation::Equals(expected) => current == expected,
            Expectation::Present => !current.is_null(),
        }
    }
}

/// Multi-field update with optional preconditions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub writes: Vec<FieldWrite>,
    #[serde(default)]
    pub preconditions: Vec<Precondition>,
}

impl FieldUpdate {
    /// First precondition that does not hold against `document`
    pub fn failed_precondition(&self, document: &Document) -> Option<&Precondition> {
        self.preconditions
            .iter()
            .find(|precondition| !precondition.holds(document))
    }

    /// Apply every write to `document`
    pub fn apply_to(&self, document: &mut Document) -> Result<(), StoreError> {
        for write in &self.writes {
            write.path.assign(document, write.value.clone())?;
        }
        Ok(())
    }

    /// Same writes with the preconditions stripped, for last-write-wins stores
    pub fn without_preconditions(&self) -> Self {
        Self {
            writes: self.writes.clone(),
            preconditions: Vec::new(),
        }
    }
}

/// Guarantees a store offers beyond the last-write-wins baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCapabilities {
    /// Preconditions are evaluated atomically with the write
    pub conditional_writes: bool,
}

/// Shared lobby document store
///
/// UseCase 層はこの trait にのみ依存し、ストアの実装技術には依存しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SharedLobbyStore: Send + Sync {
    fn capabilities(&self) -> StoreCapabilities;

    /// Create a document; fails with `AlreadyExists` on a room code collision
    async fn create_document(
        &self,
        room_code: &RoomCode,
        document: Document,
    ) -> Result<(), StoreError>;

    /// Read the current document
    async fn fetch_document(&self, room_code: &RoomCode) -> Result<Document, StoreError>;

    /// Subscribe to snapshots of a document
    async fn subscribe_document(
        &self,
        room_code: &RoomCode,
    ) -> Result<DocumentSubscription, StoreError>;

    /// Apply field writes, evaluating preconditions when supported
    async fn update_fields(&self, room_code: &RoomCode, update: FieldUpdate)
    -> Result<(), StoreError>;

    async fn delete_document(&self, room_code: &RoomCode) -> Result<(), StoreError>;
}
