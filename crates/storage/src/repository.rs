use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use prep_core::model::UserId;

use crate::document::ProgressDocument;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Contract with the external document store: one progress document per
/// authenticated user, keyed by user id.
///
/// The transport behind this trait (cloud store, local cache, ...) is not
/// this crate's concern; `InMemoryRepository` is the bundled backend for
/// tests and prototyping.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the user's document, or `None` when the user has none yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the store cannot be read.
    async fn load(&self, user: &UserId) -> Result<Option<ProgressDocument>, StorageError>;

    /// Write the user's document. With `merge` the store folds the
    /// document's fields into any existing one (absent fields keep their
    /// stored value); without it the document is replaced wholesale.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the write fails.
    async fn save(
        &self,
        user: &UserId,
        document: &ProgressDocument,
        merge: bool,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Documents are held as JSON values, the same shape a real document store
/// keeps, so serialization problems show up here and not only in
/// production.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    documents: Arc<Mutex<HashMap<String, Value>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of stored documents, mostly useful in tests.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backing lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        let guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }

    /// True when no documents are stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backing lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

/// Top-level field merge: fields present in `incoming` overwrite, fields
/// only in `existing` survive. This mirrors document-store merge writes.
fn merge_fields(existing: &mut Value, incoming: Value) {
    match (existing.as_object_mut(), incoming) {
        (Some(existing_map), Value::Object(incoming_map)) => {
            for (key, value) in incoming_map {
                existing_map.insert(key, value);
            }
        }
        (_, incoming) => *existing = incoming,
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load(&self, user: &UserId) -> Result<Option<ProgressDocument>, StorageError> {
        let guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.get(user.as_str()) {
            Some(raw) => serde_json::from_value(raw.clone())
                .map(Some)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    async fn save(
        &self,
        user: &UserId,
        document: &ProgressDocument,
        merge: bool,
    ) -> Result<(), StorageError> {
        let incoming =
            serde_json::to_value(document).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        match guard.get_mut(user.as_str()) {
            Some(existing) if merge => merge_fields(existing, incoming),
            _ => {
                guard.insert(user.as_str().to_owned(), incoming);
            }
        }
        Ok(())
    }
}

/// Aggregates the progress repository behind a trait object for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            progress: Arc::new(InMemoryRepository::new()),
        }
    }
}
