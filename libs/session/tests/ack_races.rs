//! Concurrent resolution: every pending entry completes exactly once

mod common;

use common::t0;
use session::clock::ManualClock;
use session::{AckCorrelator, HealthTracker, ResolveDisposition};
use state::{DurableStore, Keyspace, MemoryStore};
use std::sync::Arc;
use std::time::Duration;
use types::AckOutcome;

async fn correlator() -> (AckCorrelator, Arc<HealthTracker>, Arc<MemoryStore>) {
    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn DurableStore> = memory.clone();
    let clock = Arc::new(ManualClock::new(t0()));
    let health = Arc::new(
        HealthTracker::open(Keyspace::session(store.clone(), "S1"), clock.clone())
            .await
            .unwrap(),
    );
    let correlator = AckCorrelator::new(
        Keyspace::acknowledgments(store),
        health.clone(),
        clock,
        Duration::from_secs(3600),
    );
    (correlator, health, memory)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_competing_acks_resolve_once() {
    let (correlator, health, memory) = correlator().await;
    let ids: Vec<String> = (0..64).map(|i| format!("MUR{:04}", i)).collect();

    let mut handles = Vec::new();
    for id in &ids {
        handles.push(correlator.register(id, Duration::from_secs(60)).await.unwrap());
    }

    let mut tasks = Vec::new();
    for id in &ids {
        for nack in [false, true] {
            let correlator = correlator.clone();
            let id = id.clone();
            tasks.push(tokio::spawn(async move {
                correlator.resolve(&id, nack, Some("T27"), Some("Invalid BIC")).await
            }));
        }
    }

    let mut resolved = 0;
    for task in tasks {
        if task.await.unwrap() == ResolveDisposition::Resolved {
            resolved += 1;
        }
    }
    assert_eq!(resolved, ids.len());

    let mut rejections = 0;
    for handle in handles {
        if matches!(handle.wait().await.unwrap(), AckOutcome::Rejected(_)) {
            rejections += 1;
        }
    }
    assert_eq!(health.snapshot().await.rejection_count, rejections);
    assert_eq!(correlator.pending_count(), 0);
    assert!(memory.keys_with_prefix("swift:ack:").await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_ack_racing_deadline_resolves_once() {
    let (correlator, health, _) = correlator().await;
    let ids: Vec<String> = (0..32).map(|i| format!("RACE{:03}", i)).collect();

    let mut handles = Vec::new();
    for id in &ids {
        handles.push(correlator.register(id, Duration::from_millis(5)).await.unwrap());
    }

    tokio::time::sleep(Duration::from_millis(4)).await;
    let mut acknowledged_by_resolve = 0u64;
    for id in &ids {
        if correlator.resolve(id, false, None, None).await == ResolveDisposition::Resolved {
            acknowledged_by_resolve += 1;
        }
    }

    let mut timed_out = 0u64;
    let mut acknowledged = 0u64;
    for handle in handles {
        match handle.wait().await.unwrap() {
            AckOutcome::TimedOut => timed_out += 1,
            AckOutcome::Acknowledged => acknowledged += 1,
            AckOutcome::Rejected(_) => panic!("no rejection was sent"),
        }
    }

    assert_eq!(acknowledged, acknowledged_by_resolve);
    assert_eq!(timed_out + acknowledged, ids.len() as u64);
    assert_eq!(health.snapshot().await.ack_timeout_count, timed_out);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_acknowledged_entries_leave_store_empty() {
    let (correlator, _, memory) = correlator().await;
    let ids: Vec<String> = (0..16).map(|i| format!("ACK{:03}", i)).collect();

    let mut handles = Vec::new();
    for id in &ids {
        handles.push(correlator.register(id, Duration::from_secs(60)).await.unwrap());
    }
    assert_eq!(memory.len(), ids.len());

    let mut tasks = Vec::new();
    for id in &ids {
        for _ in 0..2 {
            let correlator = correlator.clone();
            let id = id.clone();
            tasks.push(tokio::spawn(async move { correlator.resolve(&id, false, None, None).await }));
        }
    }
    for task in tasks {
        task.await.unwrap();
    }

    for handle in handles {
        assert_eq!(handle.wait().await.unwrap(), AckOutcome::Acknowledged);
    }
    // Positive acknowledgments touch no health counter, so nothing is left
    assert!(memory.is_empty());
}
