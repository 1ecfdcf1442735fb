//! The persistence collaborator.
//!
//! The dispatch machinery is storage-agnostic; plugins reach the store
//! through the host handle and follow a unit-of-work discipline: stage
//! records with [`Store::add`], then [`Store::commit`], or
//! [`Store::rollback`] on failure.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A row destined for a named table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub table: String,
    pub fields: Map<String, Value>,
}

impl Record {
    /// Creates an empty record for `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Map::new(),
        }
    }

    /// Sets a field (builder pattern).
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builds a record from any serializable struct.
    pub fn from_serialize<T: Serialize>(table: impl Into<String>, value: &T) -> StoreResult<Self> {
        match serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))? {
            Value::Object(fields) => Ok(Self {
                table: table.into(),
                fields,
            }),
            other => Err(StoreError::Serialization(format!(
                "expected an object, got {other}"
            ))),
        }
    }
}

/// Errors raised by a store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The record could not be converted.
    #[error("failed to serialize record: {0}")]
    Serialization(String),

    /// The backend rejected the write.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Unit-of-work persistence handle shared by all handler invocations.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Stages a record for the next commit.
    async fn add(&self, record: Record) -> StoreResult<()>;

    /// Makes every staged record durable.
    async fn commit(&self) -> StoreResult<()>;

    /// Discards every staged record.
    async fn rollback(&self);
}

/// A shared store trait object.
pub type BoxedStore = Arc<dyn Store>;

/// A store that keeps committed records in memory.
///
/// Used when no database is configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pending: Mutex<Vec<Record>>,
    committed: Mutex<Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all committed records.
    pub fn committed(&self) -> Vec<Record> {
        self.committed.lock().clone()
    }

    /// Number of staged, uncommitted records.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn add(&self, record: Record) -> StoreResult<()> {
        self.pending.lock().push(record);
        Ok(())
    }

    async fn commit(&self) -> StoreResult<()> {
        let staged = std::mem::take(&mut *self.pending.lock());
        self.committed.lock().extend(staged);
        Ok(())
    }

    async fn rollback(&self) {
        self.pending.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commit_moves_pending_records() {
        let store = MemoryStore::new();
        store
            .add(Record::new("notes").field("text", "hi"))
            .await
            .unwrap();
        assert_eq!(store.pending_count(), 1);
        assert!(store.committed().is_empty());

        store.commit().await.unwrap();
        assert_eq!(store.pending_count(), 0);
        assert_eq!(store.committed()[0].fields["text"], "hi");
    }

    #[tokio::test]
    async fn test_rollback_discards_pending_records() {
        let store = MemoryStore::new();
        store.add(Record::new("notes")).await.unwrap();
        store.rollback().await;
        store.commit().await.unwrap();
        assert!(store.committed().is_empty());
    }

    #[test]
    fn test_record_from_serialize() {
        #[derive(Serialize)]
        struct Note {
            user_id: i64,
            text: String,
        }

        let record = Record::from_serialize(
            "notes",
            &Note {
                user_id: 7,
                text: "ok".into(),
            },
        )
        .unwrap();
        assert_eq!(record.table, "notes");
        assert_eq!(record.fields["user_id"], 7);

        assert!(Record::from_serialize("notes", &5).is_err());
    }
}
