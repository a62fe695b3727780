//! Namespaced JSON records on top of a [`DurableStore`]

use crate::{DurableStore, StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Root of every key the engine writes
pub const KEY_ROOT: &str = "swift";

/// A key prefix plus typed accessors.
///
/// `Keyspace::new(store, "swift:dup:")` maps the record name `REF1` to the
/// key `swift:dup:REF1`.
#[derive(Clone)]
pub struct Keyspace {
    store: Arc<dyn DurableStore>,
    prefix: String,
}

impl std::fmt::Debug for Keyspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyspace").field("prefix", &self.prefix).finish()
    }
}

impl Keyspace {
    pub fn new(store: Arc<dyn DurableStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// `swift:session:<id>:`
    pub fn session(store: Arc<dyn DurableStore>, session_id: &str) -> Self {
        Self::new(store, format!("{}:session:{}:", KEY_ROOT, session_id))
    }

    /// `swift:dup:`
    pub fn duplicates(store: Arc<dyn DurableStore>) -> Self {
        Self::new(store, format!("{}:dup:", KEY_ROOT))
    }

    /// `swift:ack:`
    pub fn acknowledgments(store: Arc<dyn DurableStore>) -> Self {
        Self::new(store, format!("{}:ack:", KEY_ROOT))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    pub async fn put<T>(&self, name: &str, value: &T) -> StoreResult<()>
    where
        T: Serialize + Sync,
    {
        let key = self.key(name);
        let bytes = serde_json::to_vec(value).map_err(|e| StoreError::serialization(&key, e))?;
        self.store.store(&key, &bytes).await
    }

    pub async fn get<T>(&self, name: &str) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let key = self.key(name);
        match self.store.retrieve(&key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::serialization(&key, e)),
            None => Ok(None),
        }
    }

    pub async fn delete(&self, name: &str) -> StoreResult<bool> {
        self.store.remove(&self.key(name)).await
    }

    /// Record names (keys with the prefix removed)
    pub async fn names(&self) -> StoreResult<Vec<String>> {
        let keys = self.store.keys_with_prefix(&self.prefix).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.prefix).map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counters {
        input_sequence: u64,
        output_sequence: u64,
    }

    #[tokio::test]
    async fn test_typed_records() {
        let store: Arc<dyn DurableStore> = Arc::new(MemoryStore::new());
        let session = Keyspace::session(store.clone(), "S1");
        let other = Keyspace::session(store.clone(), "S2");

        let counters = Counters {
            input_sequence: 10,
            output_sequence: 4,
        };
        session.put("counters", &counters).await.unwrap();

        assert_eq!(session.key("counters"), "swift:session:S1:counters");
        assert_eq!(session.get::<Counters>("counters").await.unwrap(), Some(counters));
        assert_eq!(other.get::<Counters>("counters").await.unwrap(), None);
        assert_eq!(session.names().await.unwrap(), vec!["counters"]);
    }

    #[tokio::test]
    async fn test_undecodable_record() {
        let store: Arc<dyn DurableStore> = Arc::new(MemoryStore::new());
        store.store("swift:dup:R1", b"not json").await.unwrap();

        let duplicates = Keyspace::duplicates(store);
        let err = duplicates.get::<Counters>("R1").await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization { .. }));
    }
}
