//! In-memory store

use crate::{DurableStore, StoreResult};
use async_trait::async_trait;
use dashmap::DashMap;

/// Process-local store; contents survive only as long as the value does.
///
/// Tests share one instance between an engine and its "restarted"
/// successor to simulate a crash.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn store(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn remove(&self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn all_keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.iter().map(|entry| entry.key().clone()).collect())
    }
}
