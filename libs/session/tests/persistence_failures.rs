//! Behavior when the durable store rejects writes

mod common;

use common::{t0, FlakyStore};
use network::ChannelTransport;
use session::clock::ManualClock;
use session::{AckCorrelator, DuplicateStore, HealthTracker, SequenceReconciler, SessionError};
use codec::ResendRequestBuilder;
use state::{DurableStore, Keyspace};
use std::sync::Arc;
use std::time::Duration;

struct Parts {
    store: Arc<FlakyStore>,
    health: Arc<HealthTracker>,
    reconciler: SequenceReconciler,
    duplicates: DuplicateStore,
    correlator: AckCorrelator,
}

async fn parts() -> Parts {
    let store = Arc::new(FlakyStore::default());
    let dyn_store: Arc<dyn DurableStore> = store.clone();
    let clock = Arc::new(ManualClock::new(t0()));
    let health = Arc::new(
        HealthTracker::open(Keyspace::session(dyn_store.clone(), "S1"), clock.clone())
            .await
            .unwrap(),
    );
    let (transport, _rx) = ChannelTransport::new("test");
    let reconciler = SequenceReconciler::new(
        Keyspace::session(dyn_store.clone(), "S1"),
        health.clone(),
        Arc::new(transport),
        ResendRequestBuilder::new("BANKBEBB", "BANKDEFF"),
        clock.clone(),
    );
    let duplicates = DuplicateStore::new(
        Keyspace::duplicates(dyn_store.clone()),
        health.clone(),
        clock.clone(),
        Duration::from_secs(3600),
    );
    let correlator = AckCorrelator::new(
        Keyspace::acknowledgments(dyn_store),
        health.clone(),
        clock,
        Duration::from_secs(3600),
    );
    Parts {
        store,
        health,
        reconciler,
        duplicates,
        correlator,
    }
}

#[tokio::test]
async fn test_failed_checkpoint_write_reports_gap_once() {
    let p = parts().await;
    p.reconciler.reconcile(10, 5).await.unwrap();

    p.store.set_failing(true);
    let err = p.reconciler.observe_input(13).await.unwrap_err();
    assert!(matches!(err, SessionError::Persistence(_)));

    let health = p.health.snapshot().await;
    assert_eq!(health.total_gap_count, 0);
    assert_eq!(health.total_resend_count, 0);
    assert!(health.persistence_failure_count >= 1);
    assert_eq!(p.reconciler.counters().await.unwrap().unwrap().input_sequence, 10);

    p.store.set_failing(false);
    let result = p.reconciler.observe_input(13).await.unwrap();
    assert!(result.gap_detected);
    assert_eq!(p.health.snapshot().await.total_gap_count, 2);
}

#[tokio::test]
async fn test_failed_registration_leaves_nothing_pending() {
    let p = parts().await;
    p.store.set_failing(true);

    let err = p.correlator.register("MUR1", Duration::from_secs(30)).await.unwrap_err();
    assert!(matches!(err, SessionError::Persistence(_)));
    assert_eq!(p.correlator.status("MUR1"), None);
    assert_eq!(p.correlator.pending_count(), 0);

    p.store.set_failing(false);
    assert!(p.correlator.register("MUR1", Duration::from_secs(30)).await.is_ok());
}

#[tokio::test]
async fn test_failed_duplicate_write_propagates() {
    let p = parts().await;
    p.store.set_failing(true);

    let err = p.duplicates.check_and_register("REF1", "M1").await.unwrap_err();
    assert!(matches!(err, SessionError::Persistence(_)));

    p.store.set_failing(false);
    let check = p.duplicates.check_and_register("REF1", "M1").await.unwrap();
    assert!(!check.is_duplicate);
}

#[tokio::test]
async fn test_health_write_failure_never_fails_caller() {
    let p = parts().await;
    p.store.set_failing(true);

    p.health.record_duplicate().await;
    p.health.record_timeout().await;

    let health = p.health.snapshot().await;
    assert_eq!(health.total_duplicate_count, 1);
    assert_eq!(health.ack_timeout_count, 1);
    assert_eq!(health.persistence_failure_count, 2);
}
