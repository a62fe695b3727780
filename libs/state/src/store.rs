//! Durable key-value collaborator

use crate::StoreResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Persistent byte store shared by all engine components.
///
/// Implementations must tolerate concurrent reads and writes of distinct
/// keys without external locking. A `store` either fully replaces the
/// value or leaves the previous one in place.
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn store(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    async fn retrieve(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Returns whether a value was present
    async fn remove(&self, key: &str) -> StoreResult<bool>;

    async fn all_keys(&self) -> StoreResult<Vec<String>>;

    async fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys = self.all_keys().await?;
        keys.retain(|k| k.starts_with(prefix));
        Ok(keys)
    }
}

#[async_trait]
impl<T: DurableStore + ?Sized> DurableStore for Arc<T> {
    async fn store(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).store(key, value).await
    }

    async fn retrieve(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).retrieve(key).await
    }

    async fn remove(&self, key: &str) -> StoreResult<bool> {
        (**self).remove(key).await
    }

    async fn all_keys(&self) -> StoreResult<Vec<String>> {
        (**self).all_keys().await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        (**self).keys_with_prefix(prefix).await
    }
}
