//! Persistent store abstraction
//!
//! The engine depends on an injected store handle rather than ambient
//! global state. Each operation assumes get/put/delete with per-call
//! atomicity; the engine itself serializes its read-modify-write sequences.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use credseal_types::{Notarization, NotarizationId, Result};

/// Storage backend for notarization records, keyed by record identity.
#[async_trait]
pub trait NotarizationStore: Send + Sync {
    /// Fetch a record by id.
    async fn get(&self, id: &NotarizationId) -> Result<Option<Notarization>>;

    /// Insert or replace a record.
    async fn put(&self, record: Notarization) -> Result<()>;

    /// Remove a record, returning it if it existed.
    async fn delete(&self, id: &NotarizationId) -> Result<Option<Notarization>>;

    /// Whether a record exists.
    async fn contains(&self, id: &NotarizationId) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Number of stored records.
    async fn len(&self) -> Result<usize>;

    /// Whether the store holds no records.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

/// In-memory store.
///
/// Thread-safe and suitable for tests and single-process deployments.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<NotarizationId, Notarization>>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotarizationStore for MemoryStore {
    async fn get(&self, id: &NotarizationId) -> Result<Option<Notarization>> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }

    async fn put(&self, record: Notarization) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete(&self, id: &NotarizationId) -> Result<Option<Notarization>> {
        let mut records = self.records.write().await;
        Ok(records.remove(id))
    }

    async fn contains(&self, id: &NotarizationId) -> Result<bool> {
        let records = self.records.read().await;
        Ok(records.contains_key(id))
    }

    async fn len(&self) -> Result<usize> {
        let records = self.records.read().await;
        Ok(records.len())
    }

    async fn is_empty(&self) -> Result<bool> {
        let records = self.records.read().await;
        Ok(records.is_empty())
    }
}
