//! Sequence Reconciliation Engine
//!
//! Compares observed counters against the durable checkpoint stored under
//! `swift:session:<id>:counters`. The checkpoint is the single
//! authoritative counter pair: every change goes through one async mutex
//! around read, compare and persist, and counters only move forward.
//!
//! ## Gap Handling
//! - Input jump past `persisted_input + 1`: the missing range is recorded
//!   in the health metrics and a resend request is handed to the transport
//!   on a spawned task. Reconciliation never waits for the send.
//! - Output jump past `persisted_output + 1`: recorded as an anomaly. The
//!   counterparty cannot fill our own output gaps, so no resend is sent.
//!
//! The checkpoint is persisted before any gap is recorded or any resend is
//! dispatched. A failed write only bumps `persistence_failure_count`; the
//! cache and gap counters stay untouched, so retrying the same observation
//! reports the gap once.

use crate::clock::SharedClock;
use crate::error::{SessionError, SessionResult};
use crate::health::HealthTracker;
use codec::{ResendRequest, ResendRequestBuilder};
use network::Transport;
use state::Keyspace;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use types::{ReconciliationResult, RecoveryAction, SequenceGap, SequenceNumber, SessionCounters};

const COUNTERS_RECORD: &str = "counters";

/// Reconciles one session's counters; cheap to clone
#[derive(Clone)]
pub struct SequenceReconciler {
    inner: Arc<ReconcilerInner>,
}

struct ReconcilerInner {
    keyspace: Keyspace,
    health: Arc<HealthTracker>,
    transport: Arc<dyn Transport>,
    resend_builder: ResendRequestBuilder,
    clock: SharedClock,
    /// Last successfully persisted counters; `None` until first loaded
    checkpoint: Mutex<Option<SessionCounters>>,
}

impl std::fmt::Debug for SequenceReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceReconciler")
            .field("prefix", &self.inner.keyspace.prefix())
            .field("transport", &self.inner.transport.name())
            .finish()
    }
}

impl SequenceReconciler {
    pub fn new(
        keyspace: Keyspace,
        health: Arc<HealthTracker>,
        transport: Arc<dyn Transport>,
        resend_builder: ResendRequestBuilder,
        clock: SharedClock,
    ) -> Self {
        Self {
            inner: Arc::new(ReconcilerInner {
                keyspace,
                health,
                transport,
                resend_builder,
                clock,
                checkpoint: Mutex::new(None),
            }),
        }
    }

    /// Reconcile both live counters against the checkpoint
    pub async fn reconcile(
        &self,
        current_input: SequenceNumber,
        current_output: SequenceNumber,
    ) -> SessionResult<ReconciliationResult> {
        self.reconcile_observed(Some(current_input), Some(current_output)).await
    }

    /// Inbound message carrying `sequence`; output comes from the checkpoint
    pub async fn observe_input(&self, sequence: SequenceNumber) -> SessionResult<ReconciliationResult> {
        self.reconcile_observed(Some(sequence), None).await
    }

    /// Outbound message sent with `sequence`; input comes from the checkpoint
    pub async fn observe_output(&self, sequence: SequenceNumber) -> SessionResult<ReconciliationResult> {
        self.reconcile_observed(None, Some(sequence)).await
    }

    /// Last persisted counters, `None` before the first reconciliation
    pub async fn counters(&self) -> SessionResult<Option<SessionCounters>> {
        let mut checkpoint = self.inner.checkpoint.lock().await;
        self.load_checkpoint(&mut *checkpoint).await
    }

    async fn reconcile_observed(
        &self,
        input: Option<SequenceNumber>,
        output: Option<SequenceNumber>,
    ) -> SessionResult<ReconciliationResult> {
        let inner = &self.inner;
        let mut checkpoint = inner.checkpoint.lock().await;

        let Some(persisted) = self.load_checkpoint(&mut *checkpoint).await? else {
            let counters = SessionCounters::new(input.unwrap_or(0), output.unwrap_or(0));
            self.persist(counters).await?;
            *checkpoint = Some(counters);
            info!(
                prefix = inner.keyspace.prefix(),
                input = counters.input_sequence,
                output = counters.output_sequence,
                "Initialized session checkpoint"
            );
            return Ok(ReconciliationResult::initialized(counters));
        };

        let current_input = input.unwrap_or(persisted.input_sequence);
        let current_output = output.unwrap_or(persisted.output_sequence);

        let missing = SequenceGap::between(persisted.input_sequence, current_input);
        let anomaly = SequenceGap::between(persisted.output_sequence, current_output);
        let next = persisted.advanced_to(current_input, current_output);

        self.persist(next).await?;
        *checkpoint = Some(next);

        let mut result = ReconciliationResult::consistent(next);

        if let Some(gap) = anomaly {
            warn!(
                prefix = inner.keyspace.prefix(),
                range = %gap,
                missing = gap.len(),
                "Output sequence jumped past checkpoint"
            );
            inner.health.record_gap(gap.len(), true).await;
            result.gap_detected = true;
            result.output_anomaly = Some(gap);
            result.recovery_action = RecoveryAction::OutputAnomalyFlagged;
        }

        if let Some(gap) = missing {
            warn!(
                prefix = inner.keyspace.prefix(),
                range = %gap,
                missing = gap.len(),
                "Input sequence gap detected"
            );
            inner.health.record_gap(gap.len(), false).await;
            self.dispatch_resend(gap, next.output_sequence.saturating_add(1)).await;
            result.gap_detected = true;
            result.missing_range = Some(gap);
            result.recovery_action = RecoveryAction::ResendRequested;
        }

        if !result.gap_detected {
            debug!(
                input = next.input_sequence,
                output = next.output_sequence,
                "Counters consistent with checkpoint"
            );
        }
        Ok(result)
    }

    async fn load_checkpoint(
        &self,
        checkpoint: &mut Option<SessionCounters>,
    ) -> SessionResult<Option<SessionCounters>> {
        if checkpoint.is_none() {
            match self.inner.keyspace.get::<SessionCounters>(COUNTERS_RECORD).await {
                Ok(loaded) => *checkpoint = loaded,
                Err(e) => {
                    error!(error = %e, "Failed to load session checkpoint");
                    self.inner.health.record_persistence_failure().await;
                    return Err(SessionError::Persistence(e));
                }
            }
        }
        Ok(*checkpoint)
    }

    async fn persist(&self, counters: SessionCounters) -> SessionResult<()> {
        if let Err(e) = self.inner.keyspace.put(COUNTERS_RECORD, &counters).await {
            error!(
                error = %e,
                input = counters.input_sequence,
                output = counters.output_sequence,
                "Failed to persist session checkpoint"
            );
            self.inner.health.record_persistence_failure().await;
            return Err(SessionError::Persistence(e));
        }
        Ok(())
    }

    /// Count the resend and hand it to the transport without waiting
    async fn dispatch_resend(&self, gap: SequenceGap, msg_seq_num: SequenceNumber) {
        let inner = &self.inner;
        let request = match ResendRequest::try_from(gap) {
            Ok(request) => request,
            Err(e) => {
                error!(range = %gap, error = %e, "Cannot build resend request");
                inner.health.record_resend_failure().await;
                return;
            }
        };
        let payload = inner.resend_builder.build(request, msg_seq_num, inner.clock.now());
        inner.health.record_resend().await;

        let task_inner = Arc::clone(inner);
        tokio::spawn(async move {
            match task_inner.transport.send(&payload).await {
                Ok(()) => info!(
                    begin = request.begin_seq_no,
                    end = request.end_seq_no,
                    transport = task_inner.transport.name(),
                    "Resend request sent"
                ),
                Err(e) => {
                    warn!(
                        begin = request.begin_seq_no,
                        end = request.end_seq_no,
                        error = %e,
                        "Resend request failed"
                    );
                    task_inner.health.record_resend_failure().await;
                }
            }
        });
    }
}
