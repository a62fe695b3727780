//! Duplicate Detection Store
//!
//! Persistent idempotency guard keyed by business reference
//! (`swift:dup:<reference>`). Detection is reference-based: two different
//! messages that share a reference are indistinguishable from a replay.
//!
//! Read-modify-write on one reference is serialized through a fixed set of
//! striped locks; distinct references hash to independent stripes and
//! proceed in parallel. A record past its retention window counts as
//! absent even before the sweeper removes it.

use crate::clock::SharedClock;
use crate::error::SessionResult;
use crate::health::HealthTracker;
use state::{Keyspace, StoreError};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use types::{DuplicateCheck, DuplicateRecord};

const LOCK_STRIPES: usize = 64;

#[derive(Debug)]
pub struct DuplicateStore {
    keyspace: Keyspace,
    health: Arc<HealthTracker>,
    clock: SharedClock,
    retention: chrono::Duration,
    stripes: Vec<Mutex<()>>,
}

impl DuplicateStore {
    pub fn new(keyspace: Keyspace, health: Arc<HealthTracker>, clock: SharedClock, retention: Duration) -> Self {
        Self {
            keyspace,
            health,
            clock,
            retention: chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX),
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    fn stripe(&self, reference: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        reference.hash(&mut hasher);
        &self.stripes[(hasher.finish() as usize) % self.stripes.len()]
    }

    /// Record a sighting of `reference` and report whether it was seen before
    pub async fn check_and_register(&self, reference: &str, message_id: &str) -> SessionResult<DuplicateCheck> {
        let _guard = self.stripe(reference).lock().await;
        let now = self.clock.now();

        let existing = self
            .keyspace
            .get::<DuplicateRecord>(reference)
            .await?
            .filter(|record| !record.is_expired(now, self.retention));

        match existing {
            Some(mut record) => {
                record.record_repeat(now);
                self.persist(&record).await?;
                self.health.record_duplicate().await;
                warn!(
                    reference,
                    message_id,
                    first_message_id = %record.message_id,
                    duplicate_count = record.duplicate_count,
                    "Duplicate business reference"
                );
                Ok(DuplicateCheck::from(&record))
            }
            None => {
                let record = DuplicateRecord::first_sighting(reference, message_id, now);
                self.persist(&record).await?;
                debug!(reference, message_id, "Registered business reference");
                Ok(DuplicateCheck::from(&record))
            }
        }
    }

    /// Current record without registering a sighting
    pub async fn lookup(&self, reference: &str) -> SessionResult<Option<DuplicateRecord>> {
        Ok(self.keyspace.get::<DuplicateRecord>(reference).await?)
    }

    /// Delete records older than the retention window; returns how many went
    pub async fn sweep_expired(&self) -> SessionResult<usize> {
        let references = self.keyspace.names().await?;
        let mut removed = 0;

        for reference in references {
            // One stripe at a time, never across the whole sweep
            let _guard = self.stripe(&reference).lock().await;
            let now = self.clock.now();
            match self.keyspace.get::<DuplicateRecord>(&reference).await {
                Ok(Some(record)) if record.is_expired(now, self.retention) => {
                    if self.keyspace.delete(&reference).await? {
                        removed += 1;
                    }
                }
                Ok(_) => {}
                Err(StoreError::Corrupted { reason, .. }) => {
                    warn!(reference = %reference, reason = %reason, "Removing unreadable duplicate record");
                    self.keyspace.delete(&reference).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if removed > 0 {
            info!(removed, "Swept expired duplicate records");
        }
        Ok(removed)
    }

    async fn persist(&self, record: &DuplicateRecord) -> SessionResult<()> {
        if let Err(e) = self.keyspace.put(&record.business_reference, record).await {
            self.health.record_persistence_failure().await;
            return Err(e.into());
        }
        Ok(())
    }
}
