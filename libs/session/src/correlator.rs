//! Asynchronous Acknowledgment Correlator
//!
//! Tracks one pending entry per outbound message id until an ACK, a NAK or
//! the deadline resolves it:
//!
//! ```text
//! PENDING ──resolve(ack)──▶ ACKNOWLEDGED
//!    │    ──resolve(nak)──▶ REJECTED{code, text}
//!    └────deadline───────▶ TIMED_OUT
//! ```
//!
//! ## Resolution
//! Every completion path (ACK, NAK, timer, hydration) removes the entry
//! from the pending table first. Removal is atomic, so when an ACK races
//! its own deadline exactly one of them wins and the other is a no-op.
//! The winner deletes the durable copy, records the outcome in the health
//! metrics, and only then publishes it to waiters.
//!
//! ## Crash Recovery
//! Registration persists `{message_id, registered_at, timeout}` under
//! `swift:ack:<message_id>`. [`AckCorrelator::hydrate`] rebuilds pending
//! entries from those records with the *remaining* budget; entries whose
//! deadline passed while the process was down time out immediately.
//!
//! ## Waiting
//! [`AckHandle`] is a `watch` subscription. Dropping it (or abandoning a
//! `wait`) leaves the entry and its timer in place, since a late ACK may
//! still arrive.

use crate::clock::SharedClock;
use crate::error::{SessionError, SessionResult};
use crate::health::HealthTracker;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use state::Keyspace;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use types::{AckOutcome, AckState, PendingAckRecord};

/// How `resolve` treated an incoming acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveDisposition {
    /// This call completed the pending entry
    Resolved,
    /// The entry had already completed; nothing changed
    AlreadyResolved,
    /// No entry known under that id (late, or never registered here)
    Unknown,
}

/// Outcome of startup hydration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrationReport {
    /// Re-armed with their remaining budget
    pub restored: Vec<String>,
    /// Deadline passed during downtime; resolved as timed out
    pub expired: Vec<String>,
    /// Unreadable durable records left in place
    pub skipped: usize,
}

/// Subscription to one pending entry
#[derive(Debug, Clone)]
pub struct AckHandle {
    message_id: String,
    rx: watch::Receiver<AckState>,
}

impl AckHandle {
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Current state without waiting
    pub fn state(&self) -> AckState {
        self.rx.borrow().clone()
    }

    /// Wait for the terminal outcome.
    ///
    /// Cancel-safe: dropping the future leaves the entry pending.
    pub async fn wait(mut self) -> SessionResult<AckOutcome> {
        let resolved = self.rx.wait_for(AckState::is_resolved).await.map_err(|_| SessionError::Abandoned {
            message_id: self.message_id.clone(),
        })?;
        match &*resolved {
            AckState::Resolved(outcome) => Ok(outcome.clone()),
            AckState::Pending => Err(SessionError::Abandoned {
                message_id: self.message_id.clone(),
            }),
        }
    }
}

struct PendingEntry {
    generation: u64,
    record: PendingAckRecord,
    deadline: Instant,
    tx: watch::Sender<AckState>,
    timer: Option<JoinHandle<()>>,
}

struct RecentOutcome {
    outcome: AckOutcome,
    resolved_at: Instant,
}

/// Which path is completing an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Acknowledgment,
    Timer(u64),
    Hydration(u64),
}

/// Correlates outbound messages with their acknowledgments; cheap to clone
#[derive(Clone)]
pub struct AckCorrelator {
    inner: Arc<CorrelatorInner>,
}

struct CorrelatorInner {
    keyspace: Keyspace,
    health: Arc<HealthTracker>,
    clock: SharedClock,
    pending: DashMap<String, PendingEntry>,
    recent: DashMap<String, RecentOutcome>,
    outcome_retention: Duration,
    next_generation: AtomicU64,
}

impl std::fmt::Debug for AckCorrelator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AckCorrelator")
            .field("pending", &self.inner.pending.len())
            .field("recent", &self.inner.recent.len())
            .finish()
    }
}

impl AckCorrelator {
    pub fn new(keyspace: Keyspace, health: Arc<HealthTracker>, clock: SharedClock, outcome_retention: Duration) -> Self {
        Self {
            inner: Arc::new(CorrelatorInner {
                keyspace,
                health,
                clock,
                pending: DashMap::new(),
                recent: DashMap::new(),
                outcome_retention,
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// Create and persist a pending entry with a single deadline
    pub async fn register(&self, message_id: &str, timeout: Duration) -> SessionResult<AckHandle> {
        let inner = &self.inner;
        let generation = inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let record = PendingAckRecord::new(message_id, inner.clock.now(), timeout);
        let (tx, rx) = watch::channel(AckState::Pending);

        match inner.pending.entry(message_id.to_string()) {
            Entry::Occupied(_) => {
                return Err(SessionError::AlreadyPending {
                    message_id: message_id.to_string(),
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingEntry {
                    generation,
                    record: record.clone(),
                    deadline: Instant::now() + timeout,
                    tx,
                    timer: None,
                });
            }
        }
        inner.recent.remove(message_id);

        if let Err(e) = inner.keyspace.put(message_id, &record).await {
            inner.pending.remove_if(message_id, |_, entry| entry.generation == generation);
            inner.health.record_persistence_failure().await;
            error!(message_id, error = %e, "Failed to persist pending acknowledgment");
            return Err(e.into());
        }

        if !self.arm_timer(message_id, generation) {
            // Resolved while the record was being written
            if let Err(e) = inner.keyspace.delete(message_id).await {
                warn!(message_id, error = %e, "Failed to remove record of early-resolved entry");
            }
        }

        debug!(message_id, timeout_ms = record.timeout_ms, "Registered pending acknowledgment");
        Ok(AckHandle {
            message_id: message_id.to_string(),
            rx,
        })
    }

    /// Complete the pending entry for `message_id` with an ACK or NAK
    pub async fn resolve(
        &self,
        message_id: &str,
        is_rejection: bool,
        code: Option<&str>,
        text: Option<&str>,
    ) -> ResolveDisposition {
        let outcome = if is_rejection {
            AckOutcome::rejected(code.unwrap_or_default(), text.unwrap_or_default())
        } else {
            AckOutcome::Acknowledged
        };

        if self.inner.complete(message_id, outcome, Completion::Acknowledgment).await {
            return ResolveDisposition::Resolved;
        }
        if self.inner.recent.contains_key(message_id) {
            debug!(message_id, "Ignoring repeated acknowledgment");
            ResolveDisposition::AlreadyResolved
        } else {
            warn!(message_id, "Discarding acknowledgment with no pending entry");
            ResolveDisposition::Unknown
        }
    }

    /// Withdraw an entry whose message never reached the transport.
    ///
    /// Waiters get [`SessionError::Abandoned`]. Returns whether an entry existed.
    pub async fn abandon(&self, message_id: &str) -> SessionResult<bool> {
        let Some((_, entry)) = self.inner.pending.remove(message_id) else {
            return Ok(false);
        };
        if let Some(timer) = entry.timer {
            timer.abort();
        }
        drop(entry.tx);
        self.inner.keyspace.delete(message_id).await?;
        info!(message_id, "Abandoned pending acknowledgment");
        Ok(true)
    }

    /// Subscribe to a pending or recently resolved entry
    pub fn handle(&self, message_id: &str) -> Option<AckHandle> {
        if let Some(entry) = self.inner.pending.get(message_id) {
            return Some(AckHandle {
                message_id: message_id.to_string(),
                rx: entry.tx.subscribe(),
            });
        }
        self.inner.recent.get(message_id).map(|recent| {
            let (_, rx) = watch::channel(AckState::Resolved(recent.outcome.clone()));
            AckHandle {
                message_id: message_id.to_string(),
                rx,
            }
        })
    }

    /// Poll the state of an entry; `None` when unknown or no longer retained
    pub fn status(&self, message_id: &str) -> Option<AckState> {
        if self.inner.pending.contains_key(message_id) {
            return Some(AckState::Pending);
        }
        self.inner
            .recent
            .get(message_id)
            .map(|recent| AckState::Resolved(recent.outcome.clone()))
    }

    /// Budget left before the entry times out
    pub fn remaining(&self, message_id: &str) -> Option<Duration> {
        self.inner
            .pending
            .get(message_id)
            .map(|entry| entry.deadline.saturating_duration_since(Instant::now()))
    }

    /// Durable record of a pending entry
    pub fn pending_record(&self, message_id: &str) -> Option<PendingAckRecord> {
        self.inner.pending.get(message_id).map(|entry| entry.record.clone())
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Rebuild pending entries from durable storage after a restart
    pub async fn hydrate(&self) -> SessionResult<HydrationReport> {
        let inner = &self.inner;
        let mut report = HydrationReport::default();

        for message_id in inner.keyspace.names().await? {
            if inner.pending.contains_key(&message_id) {
                continue;
            }
            let record = match inner.keyspace.get::<PendingAckRecord>(&message_id).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!(message_id = %message_id, error = %e, "Skipping unreadable pending acknowledgment");
                    report.skipped += 1;
                    continue;
                }
            };

            match record.remaining(inner.clock.now()) {
                None => {
                    let generation = inner.next_generation.fetch_add(1, Ordering::Relaxed);
                    let (tx, _) = watch::channel(AckState::Pending);
                    match inner.pending.entry(message_id.clone()) {
                        // Re-registered while the record was being read
                        Entry::Occupied(_) => continue,
                        Entry::Vacant(slot) => {
                            slot.insert(PendingEntry {
                                generation,
                                record,
                                deadline: Instant::now(),
                                tx,
                                timer: None,
                            });
                        }
                    }
                    if inner
                        .complete(&message_id, AckOutcome::TimedOut, Completion::Hydration(generation))
                        .await
                    {
                        report.expired.push(message_id);
                    }
                }
                Some(remaining) => {
                    let generation = inner.next_generation.fetch_add(1, Ordering::Relaxed);
                    let (tx, _) = watch::channel(AckState::Pending);
                    let restored = match inner.pending.entry(message_id.clone()) {
                        Entry::Occupied(_) => false,
                        Entry::Vacant(slot) => {
                            slot.insert(PendingEntry {
                                generation,
                                record,
                                deadline: Instant::now() + remaining,
                                tx,
                                timer: None,
                            });
                            true
                        }
                    };
                    if restored && self.arm_timer(&message_id, generation) {
                        debug!(
                            message_id = %message_id,
                            remaining_ms = remaining.as_millis() as u64,
                            "Restored pending acknowledgment"
                        );
                        report.restored.push(message_id);
                    }
                }
            }
        }

        info!(
            restored = report.restored.len(),
            expired = report.expired.len(),
            skipped = report.skipped,
            "Hydrated pending acknowledgments"
        );
        Ok(report)
    }

    /// Remove durable records with no live entry whose deadline has passed,
    /// and forget resolved outcomes older than the retention window.
    pub async fn sweep_orphans(&self) -> SessionResult<usize> {
        let inner = &self.inner;
        let mut removed = 0;

        for message_id in inner.keyspace.names().await? {
            if inner.pending.contains_key(&message_id) {
                continue;
            }
            let expired = match inner.keyspace.get::<PendingAckRecord>(&message_id).await {
                Ok(Some(record)) => record.remaining(inner.clock.now()).is_none(),
                Ok(None) => false,
                Err(e) => {
                    warn!(message_id = %message_id, error = %e, "Removing unreadable pending acknowledgment");
                    true
                }
            };
            // Re-check: a registration may have raced the read
            if expired && !inner.pending.contains_key(&message_id) && inner.keyspace.delete(&message_id).await? {
                removed += 1;
            }
        }

        let retention = inner.outcome_retention;
        inner.recent.retain(|_, recent| recent.resolved_at.elapsed() < retention);

        if removed > 0 {
            info!(removed, "Swept orphaned pending acknowledgments");
        }
        Ok(removed)
    }

    /// Spawn the deadline task for an entry; false if it already completed
    fn arm_timer(&self, message_id: &str, generation: u64) -> bool {
        let Some(mut entry) = self.inner.pending.get_mut(message_id) else {
            return false;
        };
        if entry.generation != generation {
            return false;
        }

        let weak: Weak<CorrelatorInner> = Arc::downgrade(&self.inner);
        let id = message_id.to_string();
        let deadline = entry.deadline;
        entry.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                inner.complete(&id, AckOutcome::TimedOut, Completion::Timer(generation)).await;
            }
        }));
        true
    }
}

impl CorrelatorInner {
    /// First-writer-wins completion; returns whether this call won
    async fn complete(&self, message_id: &str, outcome: AckOutcome, completion: Completion) -> bool {
        let removed = match completion {
            Completion::Timer(generation) | Completion::Hydration(generation) => self
                .pending
                .remove_if(message_id, |_, entry| entry.generation == generation),
            Completion::Acknowledgment => self.pending.remove(message_id),
        };
        let Some((_, entry)) = removed else {
            return false;
        };

        // A timer must not abort itself mid-completion
        if !matches!(completion, Completion::Timer(_)) {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
        }

        if let Err(e) = self.keyspace.delete(message_id).await {
            error!(message_id, error = %e, "Failed to remove resolved acknowledgment record");
            self.health.record_persistence_failure().await;
        }

        match &outcome {
            AckOutcome::Acknowledged => {
                info!(message_id, "Message acknowledged");
            }
            AckOutcome::Rejected(details) => {
                warn!(message_id, code = %details.code, text = %details.text, "Message rejected");
                self.health.record_rejection().await;
            }
            AckOutcome::TimedOut => {
                warn!(
                    message_id,
                    timeout_ms = entry.record.timeout_ms,
                    "Acknowledgment timed out"
                );
                self.health.record_timeout().await;
            }
        }

        self.recent.insert(
            message_id.to_string(),
            RecentOutcome {
                outcome: outcome.clone(),
                resolved_at: Instant::now(),
            },
        );
        entry.tx.send_replace(AckState::Resolved(outcome));
        true
    }
}

impl Drop for CorrelatorInner {
    fn drop(&mut self) {
        for entry in self.pending.iter() {
            if let Some(timer) = &entry.timer {
                timer.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use chrono::{TimeZone, Utc};
    use async_trait::async_trait;
    use state::{DurableStore, MemoryStore, StoreResult};
    use tokio::sync::oneshot;

    /// Pauses the first read of one key until released
    struct PausedRead {
        inner: MemoryStore,
        key: String,
        reached: parking_lot::Mutex<Option<oneshot::Sender<()>>>,
        release: parking_lot::Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl DurableStore for PausedRead {
        async fn store(&self, key: &str, value: &[u8]) -> StoreResult<()> {
            self.inner.store(key, value).await
        }

        async fn retrieve(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
            let value = self.inner.retrieve(key).await?;
            let reached = if key == self.key { self.reached.lock().take() } else { None };
            if let Some(reached) = reached {
                let _ = reached.send(());
                let release = self.release.lock().take();
                if let Some(release) = release {
                    let _ = release.await;
                }
            }
            Ok(value)
        }

        async fn remove(&self, key: &str) -> StoreResult<bool> {
            self.inner.remove(key).await
        }

        async fn all_keys(&self) -> StoreResult<Vec<String>> {
            self.inner.all_keys().await
        }
    }

    struct Fixture {
        correlator: AckCorrelator,
        store: Arc<dyn DurableStore>,
        clock: Arc<ManualClock>,
        health: Arc<HealthTracker>,
    }

    async fn fixture() -> Fixture {
        fixture_with(Arc::new(MemoryStore::new())).await
    }

    async fn fixture_with(store: Arc<dyn DurableStore>) -> Fixture {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()));
        let health = Arc::new(
            HealthTracker::open(Keyspace::session(store.clone(), "S1"), clock.clone())
                .await
                .unwrap(),
        );
        let correlator = AckCorrelator::new(
            Keyspace::acknowledgments(store.clone()),
            health.clone(),
            clock.clone(),
            Duration::from_secs(3600),
        );
        Fixture {
            correlator,
            store,
            clock,
            health,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_acknowledged() {
        let f = fixture().await;
        let handle = f.correlator.register("MSG1", Duration::from_secs(30)).await.unwrap();
        assert!(f.store.retrieve("swift:ack:MSG1").await.unwrap().is_some());
        assert_eq!(f.correlator.status("MSG1"), Some(AckState::Pending));

        let disposition = f.correlator.resolve("MSG1", false, None, None).await;
        assert_eq!(disposition, ResolveDisposition::Resolved);
        assert_eq!(handle.wait().await.unwrap(), AckOutcome::Acknowledged);
        assert!(f.store.retrieve("swift:ack:MSG1").await.unwrap().is_none());
        assert_eq!(f.correlator.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_once() {
        let f = fixture().await;
        let handle = f.correlator.register("MSG2", Duration::from_secs(30)).await.unwrap();

        let first = f.correlator.resolve("MSG2", true, Some("T27"), Some("Invalid BIC")).await;
        let second = f.correlator.resolve("MSG2", false, None, None).await;
        assert_eq!(first, ResolveDisposition::Resolved);
        assert_eq!(second, ResolveDisposition::AlreadyResolved);

        assert_eq!(handle.wait().await.unwrap(), AckOutcome::rejected("T27", "Invalid BIC"));
        assert_eq!(f.health.snapshot().await.rejection_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let f = fixture().await;
        let handle = f.correlator.register("MSG3", Duration::from_secs(30)).await.unwrap();

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(handle.state(), AckState::Pending);

        assert_eq!(handle.wait().await.unwrap(), AckOutcome::TimedOut);
        assert_eq!(
            f.correlator.resolve("MSG3", false, None, None).await,
            ResolveDisposition::AlreadyResolved
        );
        assert_eq!(f.health.snapshot().await.ack_timeout_count, 1);
        assert!(f.store.retrieve("swift:ack:MSG3").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_registration_rejected() {
        let f = fixture().await;
        let _handle = f.correlator.register("MSG4", Duration::from_secs(30)).await.unwrap();
        let err = f.correlator.register("MSG4", Duration::from_secs(30)).await.unwrap_err();
        assert!(matches!(err, SessionError::AlreadyPending { .. }));

        // Once resolved the id may be reused
        f.correlator.resolve("MSG4", false, None, None).await;
        assert!(f.correlator.register("MSG4", Duration::from_secs(30)).await.is_ok());
        assert_eq!(f.correlator.status("MSG4"), Some(AckState::Pending));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_acknowledgment_discarded() {
        let f = fixture().await;
        assert_eq!(
            f.correlator.resolve("NOPE", false, None, None).await,
            ResolveDisposition::Unknown
        );
        assert_eq!(f.correlator.status("NOPE"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_keeps_entry() {
        let f = fixture().await;
        let handle = f.correlator.register("MSG5", Duration::from_secs(30)).await.unwrap();
        drop(handle);

        assert_eq!(f.correlator.status("MSG5"), Some(AckState::Pending));
        let again = f.correlator.handle("MSG5").unwrap();
        f.correlator.resolve("MSG5", false, None, None).await;
        assert_eq!(again.wait().await.unwrap(), AckOutcome::Acknowledged);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandon() {
        let f = fixture().await;
        let handle = f.correlator.register("MSG6", Duration::from_secs(30)).await.unwrap();
        assert!(f.correlator.abandon("MSG6").await.unwrap());
        assert!(!f.correlator.abandon("MSG6").await.unwrap());

        assert!(matches!(handle.wait().await, Err(SessionError::Abandoned { .. })));
        assert!(f.store.retrieve("swift:ack:MSG6").await.unwrap().is_none());
        assert_eq!(f.health.snapshot().await.ack_timeout_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_wakes_on_resolution() {
        let f = fixture().await;
        let handle = f.correlator.register("MSG7", Duration::from_secs(30)).await.unwrap();
        let mut wait = tokio_test::task::spawn(handle.wait());
        tokio_test::assert_pending!(wait.poll());

        f.correlator.resolve("MSG7", false, None, None).await;
        assert!(wait.is_woken());
        let outcome = tokio_test::assert_ready!(wait.poll());
        assert_eq!(outcome.unwrap(), AckOutcome::Acknowledged);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_orphans() {
        let f = fixture().await;
        let stale = PendingAckRecord::new("ORPHAN", f.clock.now(), Duration::from_secs(10));
        Keyspace::acknowledgments(f.store.clone())
            .put("ORPHAN", &stale)
            .await
            .unwrap();
        let _live = f.correlator.register("LIVE", Duration::from_secs(10)).await.unwrap();

        assert_eq!(f.correlator.sweep_orphans().await.unwrap(), 0);
        f.clock.advance(Duration::from_secs(11));
        assert_eq!(f.correlator.sweep_orphans().await.unwrap(), 1);
        assert!(f.store.retrieve("swift:ack:ORPHAN").await.unwrap().is_none());
        assert!(f.store.retrieve("swift:ack:LIVE").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hydration_leaves_concurrent_registration_alone() {
        let (reached_tx, reached_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let paused = Arc::new(PausedRead {
            inner: MemoryStore::new(),
            key: "swift:ack:MSG8".to_string(),
            reached: parking_lot::Mutex::new(Some(reached_tx)),
            release: parking_lot::Mutex::new(Some(release_rx)),
        });
        let f = fixture_with(paused).await;

        // Left behind by a previous process, deadline long gone
        let stale = PendingAckRecord::new("MSG8", f.clock.now(), Duration::from_secs(10));
        Keyspace::acknowledgments(f.store.clone())
            .put("MSG8", &stale)
            .await
            .unwrap();
        f.clock.advance(Duration::from_secs(60));

        let hydrating = tokio::spawn({
            let correlator = f.correlator.clone();
            async move { correlator.hydrate().await }
        });
        reached_rx.await.unwrap();

        // The stale record has been read; a fresh send reuses the id
        let live = f.correlator.register("MSG8", Duration::from_secs(30)).await.unwrap();
        release_tx.send(()).unwrap();
        let report = hydrating.await.unwrap().unwrap();

        assert!(report.expired.is_empty());
        assert!(report.restored.is_empty());
        assert_eq!(live.state(), AckState::Pending);
        assert_eq!(f.correlator.status("MSG8"), Some(AckState::Pending));
        assert_eq!(f.correlator.pending_record("MSG8").unwrap().registered_at, f.clock.now());
        assert!(f.store.retrieve("swift:ack:MSG8").await.unwrap().is_some());
        assert_eq!(f.health.snapshot().await.ack_timeout_count, 0);

        f.correlator.resolve("MSG8", false, None, None).await;
        assert_eq!(live.wait().await.unwrap(), AckOutcome::Acknowledged);
    }
}
