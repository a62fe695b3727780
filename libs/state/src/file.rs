//! File-backed store
//!
//! One file per key under a directory. File names are the hex encoding of
//! the key, so arbitrary references are safe on any filesystem. Each file
//! starts with a CRC32 header line over the value bytes:
//!
//! ```text
//! crc32:1A2B3C4D
//! <value bytes>
//! ```
//!
//! Writes go to a temporary file that is synced and then renamed over the
//! target, so a crash leaves either the old or the new record.

use crate::{DurableStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const RECORD_EXTENSION: &str = "rec";
const TEMP_MARKER: &str = ".tmp-";
const HEADER_PREFIX: &[u8] = b"crc32:";
const HEADER_LEN: usize = 6 + 8 + 1;

#[derive(Debug)]
pub struct FileStore {
    directory: PathBuf,
    temp_counter: AtomicU64,
}

impl FileStore {
    /// Open a store rooted at `directory`, creating it if needed
    pub async fn open(directory: impl Into<PathBuf>) -> StoreResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)
            .await
            .map_err(|e| StoreError::io(directory.display().to_string(), e))?;
        info!(directory = %directory.display(), "Opened file store");
        Ok(Self {
            directory,
            temp_counter: AtomicU64::new(0),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.directory
            .join(format!("{}.{}", hex::encode(key.as_bytes()), RECORD_EXTENSION))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        self.directory.join(format!(
            "{}{}{}-{}",
            hex::encode(key.as_bytes()),
            TEMP_MARKER,
            std::process::id(),
            n
        ))
    }
}

fn encode_record(value: &[u8]) -> Vec<u8> {
    let mut record = Vec::with_capacity(HEADER_LEN + value.len());
    record.extend_from_slice(HEADER_PREFIX);
    record.extend_from_slice(format!("{:08X}", crc32fast::hash(value)).as_bytes());
    record.push(b'\n');
    record.extend_from_slice(value);
    record
}

fn decode_record(key: &str, record: &[u8]) -> StoreResult<Vec<u8>> {
    if record.len() < HEADER_LEN || !record.starts_with(HEADER_PREFIX) || record[HEADER_LEN - 1] != b'\n' {
        return Err(StoreError::corrupted(key, "missing checksum header"));
    }
    let claimed = std::str::from_utf8(&record[HEADER_PREFIX.len()..HEADER_LEN - 1])
        .ok()
        .and_then(|s| u32::from_str_radix(s, 16).ok())
        .ok_or_else(|| StoreError::corrupted(key, "unreadable checksum header"))?;

    let value = &record[HEADER_LEN..];
    let calculated = crc32fast::hash(value);
    if claimed != calculated {
        return Err(StoreError::corrupted(
            key,
            format!("checksum mismatch: expected {:08X}, calculated {:08X}", claimed, calculated),
        ));
    }
    Ok(value.to_vec())
}

fn key_from_file_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix(RECORD_EXTENSION)?.strip_suffix('.')?;
    let bytes = hex::decode(stem).ok()?;
    String::from_utf8(bytes).ok()
}

#[async_trait]
impl DurableStore for FileStore {
    async fn store(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let target = self.record_path(key);
        let temp = self.temp_path(key);

        let mut file = fs::File::create(&temp).await.map_err(|e| StoreError::io(key, e))?;
        let written = async {
            file.write_all(&encode_record(value)).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            let _ = fs::remove_file(&temp).await;
            return Err(StoreError::io(key, e));
        }
        drop(file);

        if let Err(e) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StoreError::io(key, e));
        }
        debug!(key, bytes = value.len(), "Stored record");
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.record_path(key)).await {
            Ok(record) => decode_record(key, &record).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    async fn remove(&self, key: &str) -> StoreResult<bool> {
        match fs::remove_file(self.record_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    async fn all_keys(&self) -> StoreResult<Vec<String>> {
        let dir_name = self.directory.display().to_string();
        let mut entries = fs::read_dir(&self.directory)
            .await
            .map_err(|e| StoreError::io(&dir_name, e))?;

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| StoreError::io(&dir_name, e))? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.contains(TEMP_MARKER) {
                continue;
            }
            match key_from_file_name(name) {
                Some(key) => keys.push(key),
                None => warn!(file = name, "Ignoring unrecognized file in store directory"),
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).await.unwrap();
            store.store("swift:ack:MSG/1", br#"{"timeout_ms":300000}"#).await.unwrap();
            store.store("swift:dup:REF 9", b"{}").await.unwrap();
        }

        let reopened = FileStore::open(dir.path()).await.unwrap();
        let mut keys = reopened.all_keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["swift:ack:MSG/1", "swift:dup:REF 9"]);
        assert_eq!(
            reopened.retrieve("swift:ack:MSG/1").await.unwrap(),
            Some(br#"{"timeout_ms":300000}"#.to_vec())
        );
    }

    #[tokio::test]
    async fn test_overwrite_and_remove() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.store("k", b"one").await.unwrap();
        store.store("k", b"two").await.unwrap();
        assert_eq!(store.retrieve("k").await.unwrap(), Some(b"two".to_vec()));

        assert!(store.remove("k").await.unwrap());
        assert!(!store.remove("k").await.unwrap());
        assert_eq!(store.retrieve("k").await.unwrap(), None);
        assert!(store.all_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detects_corruption() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.store("swift:session:S1:counters", br#"{"input_sequence":10}"#).await.unwrap();

        let path = store.record_path("swift:session:S1:counters");
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 2;
        bytes[last] = b'9';
        std::fs::write(&path, bytes).unwrap();

        let err = store.retrieve("swift:session:S1:counters").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { .. }));

        std::fs::write(&path, b"no header").unwrap();
        assert!(matches!(
            store.retrieve("swift:session:S1:counters").await,
            Err(StoreError::Corrupted { .. })
        ));
    }

    #[test]
    fn test_file_name_round_trip() {
        let name = format!("{}.{}", hex::encode("swift:dup:A"), RECORD_EXTENSION);
        assert_eq!(key_from_file_name(&name).as_deref(), Some("swift:dup:A"));
        assert_eq!(key_from_file_name("notes.txt"), None);
    }
}
