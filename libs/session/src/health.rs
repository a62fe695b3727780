//! Session Health Tracker
//!
//! Owns the cumulative [`SessionHealth`] record of one session. Every
//! component records into it before propagating a terminal condition, and
//! each update is persisted under `swift:session:<id>:health`.
//!
//! A failed health write never fails the caller: it is logged, counted in
//! `persistence_failure_count`, and retried implicitly by the next update.

use crate::clock::SharedClock;
use crate::error::SessionResult;
use state::Keyspace;
use tokio::sync::Mutex;
use tracing::{error, info};
use types::SessionHealth;

const HEALTH_RECORD: &str = "health";

#[derive(Debug)]
pub struct HealthTracker {
    keyspace: Keyspace,
    clock: SharedClock,
    health: Mutex<SessionHealth>,
}

impl HealthTracker {
    /// Load the persisted record, starting from zero when none exists
    pub async fn open(keyspace: Keyspace, clock: SharedClock) -> SessionResult<Self> {
        let health = keyspace.get::<SessionHealth>(HEALTH_RECORD).await?.unwrap_or_default();
        Ok(Self {
            keyspace,
            clock,
            health: Mutex::new(health),
        })
    }

    pub async fn snapshot(&self) -> SessionHealth {
        self.health.lock().await.clone()
    }

    /// Administrative reset; the only way counters go back to zero
    pub async fn reset(&self) -> SessionResult<SessionHealth> {
        let mut health = self.health.lock().await;
        let fresh = SessionHealth {
            last_reset_at: Some(self.clock.now()),
            ..SessionHealth::default()
        };
        self.keyspace.put(HEALTH_RECORD, &fresh).await?;
        *health = fresh.clone();
        info!(prefix = self.keyspace.prefix(), "Session health metrics reset");
        Ok(fresh)
    }

    /// Input gap (`output == false`) or output anomaly of `missing` messages
    pub async fn record_gap(&self, missing: u64, output: bool) {
        let now = self.clock.now();
        self.update(|h| {
            h.total_gap_count = h.total_gap_count.saturating_add(missing);
            h.last_gap_detected_at = Some(now);
            if output {
                h.output_anomaly_count += 1;
            }
        })
        .await;
    }

    pub async fn record_resend(&self) {
        let now = self.clock.now();
        self.update(|h| {
            h.total_resend_count += 1;
            h.last_resend_requested_at = Some(now);
        })
        .await;
    }

    pub async fn record_resend_failure(&self) {
        self.update(|h| h.resend_failure_count += 1).await;
    }

    pub async fn record_duplicate(&self) {
        self.update(|h| h.total_duplicate_count += 1).await;
    }

    pub async fn record_integrity_failure(&self) {
        self.update(|h| h.integrity_failure_count += 1).await;
    }

    pub async fn record_timeout(&self) {
        self.update(|h| h.ack_timeout_count += 1).await;
    }

    pub async fn record_rejection(&self) {
        self.update(|h| h.rejection_count += 1).await;
    }

    pub async fn record_persistence_failure(&self) {
        self.update(|h| h.persistence_failure_count += 1).await;
    }

    async fn update(&self, apply: impl FnOnce(&mut SessionHealth)) {
        let mut health = self.health.lock().await;
        apply(&mut health);
        if let Err(e) = self.keyspace.put(HEALTH_RECORD, &*health).await {
            health.persistence_failure_count += 1;
            error!(error = %e, "Failed to persist session health");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use state::{DurableStore, MemoryStore};
    use std::sync::Arc;

    fn clock() -> SharedClock {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn test_updates_are_persisted() {
        let store: Arc<dyn DurableStore> = Arc::new(MemoryStore::new());
        let tracker = HealthTracker::open(Keyspace::session(store.clone(), "S1"), clock())
            .await
            .unwrap();

        tracker.record_gap(2, false).await;
        tracker.record_resend().await;
        tracker.record_gap(3, true).await;
        tracker.record_duplicate().await;

        let reopened = HealthTracker::open(Keyspace::session(store, "S1"), clock()).await.unwrap();
        let health = reopened.snapshot().await;
        assert_eq!(health.total_gap_count, 5);
        assert_eq!(health.output_anomaly_count, 1);
        assert_eq!(health.total_resend_count, 1);
        assert_eq!(health.total_duplicate_count, 1);
        assert!(health.last_resend_requested_at.is_some());
    }

    #[tokio::test]
    async fn test_reset() {
        let store: Arc<dyn DurableStore> = Arc::new(MemoryStore::new());
        let tracker = HealthTracker::open(Keyspace::session(store, "S1"), clock()).await.unwrap();
        tracker.record_timeout().await;
        tracker.record_rejection().await;

        let fresh = tracker.reset().await.unwrap();
        assert_eq!(fresh.ack_timeout_count, 0);
        assert_eq!(fresh.rejection_count, 0);
        assert!(fresh.last_reset_at.is_some());
        assert_eq!(tracker.snapshot().await, fresh);
    }
}
