//! Session facade: the outbound and inbound pipelines over all components.
//!
//! ```text
//! send:    body → trailer → register pending → transport → observe output seq
//! inbound: raw → validate trailer → observe input seq ─┬─ ACK/NAK → classify → resolve
//!                                                      └─ other   → duplicate check
//! ```

use crate::clock::SharedClock;
use crate::correlator::{AckCorrelator, AckHandle, HydrationReport, ResolveDisposition};
use crate::duplicate::DuplicateStore;
use crate::error::{SessionError, SessionResult};
use crate::health::HealthTracker;
use crate::maintenance::{spawn_maintenance, MaintenanceHandle};
use crate::reconciliation::SequenceReconciler;
use codec::{
    strip_trailer, AckReport, BilateralKey, MessageEnvelope, ProtocolError, RejectCodeClassifier,
    RejectCodeDictionary, ResendRequestBuilder, TrailerService,
};
use network::Transport;
use session_config::{EngineConfig, StorageBackend, StorageSettings};
use state::{DurableStore, FileStore, Keyspace, MemoryStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use types::{DuplicateCheck, ReconciliationResult, SequenceNumber, SessionCounters, SessionHealth};

const UNPARSEABLE_ACK_CODE: &str = "";
const UNPARSEABLE_ACK_TEXT: &str = "unparseable acknowledgment";

/// Open the durable store named by the storage settings
pub async fn open_store(settings: &StorageSettings) -> SessionResult<Arc<dyn DurableStore>> {
    match settings.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::File => {
            let directory = settings
                .directory
                .as_ref()
                .ok_or_else(|| SessionError::configuration("file storage requires a directory"))?;
            Ok(Arc::new(FileStore::open(directory.clone()).await?))
        }
    }
}

/// What the inbound pipeline did with a message
#[derive(Debug, Clone)]
pub enum InboundDisposition {
    /// Business message accepted; `duplicate_check` is `None` when it carried no reference
    Accepted {
        envelope: MessageEnvelope,
        reconciliation: ReconciliationResult,
        duplicate_check: Option<DuplicateCheck>,
    },
    /// Business reference already seen inside the retention window
    Duplicate {
        envelope: MessageEnvelope,
        reconciliation: ReconciliationResult,
        duplicate_check: DuplicateCheck,
    },
    /// ACK/NAK classified and matched against the pending table
    Acknowledgment {
        envelope: MessageEnvelope,
        reconciliation: ReconciliationResult,
        report: AckReport,
        resolution: ResolveDisposition,
    },
}

impl InboundDisposition {
    pub fn envelope(&self) -> &MessageEnvelope {
        match self {
            Self::Accepted { envelope, .. }
            | Self::Duplicate { envelope, .. }
            | Self::Acknowledgment { envelope, .. } => envelope,
        }
    }

    pub fn reconciliation(&self) -> &ReconciliationResult {
        match self {
            Self::Accepted { reconciliation, .. }
            | Self::Duplicate { reconciliation, .. }
            | Self::Acknowledgment { reconciliation, .. } => reconciliation,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Startup state after crash recovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    pub hydration: HydrationReport,
    /// `None` when the session has never been reconciled
    pub counters: Option<SessionCounters>,
}

/// One SWIFT session with all resilience components wired together
pub struct SwiftSession {
    session_id: String,
    trailer: TrailerService,
    classifier: Arc<RejectCodeClassifier>,
    health: Arc<HealthTracker>,
    reconciler: SequenceReconciler,
    duplicates: Arc<DuplicateStore>,
    correlator: AckCorrelator,
    transport: Arc<dyn Transport>,
    ack_timeout: Duration,
    sweep_interval: Duration,
}

impl std::fmt::Debug for SwiftSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwiftSession")
            .field("session_id", &self.session_id)
            .field("transport", &self.transport.name())
            .field("ack_timeout", &self.ack_timeout)
            .field("correlator", &self.correlator)
            .finish()
    }
}

impl SwiftSession {
    /// Build a session from validated configuration
    pub async fn new(
        config: &EngineConfig,
        store: Arc<dyn DurableStore>,
        transport: Arc<dyn Transport>,
        clock: SharedClock,
    ) -> SessionResult<Self> {
        let key_bytes = config
            .security
            .key_bytes()
            .map_err(|e| SessionError::configuration(format!("{:#}", e)))?;
        let key = BilateralKey::new(key_bytes).map_err(|e| SessionError::configuration(e.to_string()))?;

        let dictionary = match &config.reject_codes.dictionary_path {
            Some(path) => RejectCodeDictionary::from_file(path).map_err(|e| SessionError::configuration(e.to_string()))?,
            None => RejectCodeDictionary::builtin(),
        };

        let session_id = config.session.session_id.clone();
        let health = Arc::new(HealthTracker::open(Keyspace::session(store.clone(), &session_id), clock.clone()).await?);

        let reconciler = SequenceReconciler::new(
            Keyspace::session(store.clone(), &session_id),
            health.clone(),
            transport.clone(),
            ResendRequestBuilder::new(&config.session.sender_id, &config.session.target_id),
            clock.clone(),
        );
        let duplicates = Arc::new(DuplicateStore::new(
            Keyspace::duplicates(store.clone()),
            health.clone(),
            clock.clone(),
            config.duplicates.retention(),
        ));
        let correlator = AckCorrelator::new(
            Keyspace::acknowledgments(store),
            health.clone(),
            clock,
            config.acknowledgments.outcome_retention(),
        );

        info!(
            session_id = %session_id,
            transport = transport.name(),
            reject_codes = dictionary.len(),
            "Session assembled"
        );

        Ok(Self {
            session_id,
            trailer: TrailerService::new(key),
            classifier: Arc::new(RejectCodeClassifier::new(dictionary)),
            health,
            reconciler,
            duplicates,
            correlator,
            transport,
            ack_timeout: config.acknowledgments.timeout(),
            sweep_interval: config.maintenance.sweep_interval(),
        })
    }

    /// Crash recovery: rehydrate pending acknowledgments and load the checkpoint
    pub async fn start(&self) -> SessionResult<StartupReport> {
        let hydration = self.correlator.hydrate().await?;
        let counters = self.reconciler.counters().await?;
        info!(
            session_id = %self.session_id,
            restored = hydration.restored.len(),
            expired = hydration.expired.len(),
            input = counters.map(|c| c.input_sequence),
            output = counters.map(|c| c.output_sequence),
            "Session started"
        );
        Ok(StartupReport { hydration, counters })
    }

    /// Send with the configured acknowledgment timeout
    pub async fn send(&self, message_id: &str, body: &str) -> SessionResult<AckHandle> {
        self.send_with_timeout(message_id, body, self.ack_timeout).await
    }

    /// Append the trailer, register the pending entry, then hand to the transport.
    ///
    /// ACKs are matched on the message user reference (tag 108), so a body
    /// carrying one must carry `message_id`. The entry is registered before
    /// the send so an immediate ACK always finds it. A failed send withdraws
    /// the registration.
    pub async fn send_with_timeout(&self, message_id: &str, body: &str, timeout: Duration) -> SessionResult<AckHandle> {
        let framed = self.trailer.append_trailer(body)?;
        let envelope = MessageEnvelope::parse(&framed)?;

        if let Some(reference) = envelope.user_reference.as_deref() {
            if reference != message_id {
                warn!(message_id, reference, "Refusing send: user reference differs from message id");
                return Err(ProtocolError::reference_mismatch(message_id, reference).into());
            }
        }

        let handle = self.correlator.register(message_id, timeout).await?;

        if let Err(e) = self.transport.send(framed.as_bytes()).await {
            error!(message_id, transport = self.transport.name(), error = %e, "Send failed");
            if let Err(abandon_err) = self.correlator.abandon(message_id).await {
                error!(message_id, error = %abandon_err, "Failed to withdraw pending acknowledgment");
            }
            return Err(e.into());
        }

        if let Err(e) = self.reconciler.observe_output(envelope.sequence_number()).await {
            // The message is on the wire; the handle must still reach the caller
            error!(
                message_id,
                sequence = envelope.sequence_number(),
                error = %e,
                "Failed to record output sequence"
            );
        }

        debug!(message_id, sequence = envelope.sequence_number(), "Message sent");
        Ok(handle)
    }

    /// Inbound frame from a transport listener
    pub async fn handle_frame(&self, frame: &[u8]) -> SessionResult<InboundDisposition> {
        let raw = std::str::from_utf8(frame).map_err(|e| {
            SessionError::Protocol(ProtocolError::malformed_block(e.valid_up_to(), "invalid UTF-8", frame.len()))
        })?;
        self.handle_inbound(raw).await
    }

    /// Run the inbound pipeline on one raw message
    pub async fn handle_inbound(&self, raw: &str) -> SessionResult<InboundDisposition> {
        let validation = self.trailer.validate_trailer(raw)?;
        if let Some(reason) = validation.reason.filter(|_| !validation.valid) {
            self.health.record_integrity_failure().await;
            error!(
                session_id = %self.session_id,
                reason = %reason,
                security = reason.is_security_relevant(),
                "Inbound message failed integrity check"
            );
            return Err(SessionError::Integrity { reason });
        }

        let body = strip_trailer(raw);
        let envelope = MessageEnvelope::parse(body)?;
        let reconciliation = self.reconciler.observe_input(envelope.sequence_number()).await?;

        if envelope.is_acknowledgment() || codec::is_acknowledgment(body) {
            return self.handle_acknowledgment(body, envelope, reconciliation).await;
        }

        let Some(reference) = envelope.business_reference.clone() else {
            warn!(
                sequence = envelope.sequence_number(),
                "Inbound message carries no business reference; duplicate check skipped"
            );
            return Ok(InboundDisposition::Accepted {
                envelope,
                reconciliation,
                duplicate_check: None,
            });
        };

        let message_id = envelope
            .user_reference
            .clone()
            .unwrap_or_else(|| envelope.sequence_number().to_string());
        let duplicate_check = self.duplicates.check_and_register(&reference, &message_id).await?;

        if duplicate_check.is_duplicate {
            Ok(InboundDisposition::Duplicate {
                envelope,
                reconciliation,
                duplicate_check,
            })
        } else {
            Ok(InboundDisposition::Accepted {
                envelope,
                reconciliation,
                duplicate_check: Some(duplicate_check),
            })
        }
    }

    async fn handle_acknowledgment(
        &self,
        body: &str,
        envelope: MessageEnvelope,
        reconciliation: ReconciliationResult,
    ) -> SessionResult<InboundDisposition> {
        let report = match self.classifier.parse(body) {
            Ok(report) => report,
            Err(e) => {
                // Fail closed: an acknowledgment we cannot read is a rejection
                error!(error = %e, sequence = envelope.sequence_number(), "Unparseable acknowledgment");
                if let Some(reference) = envelope.user_reference.as_deref() {
                    self.correlator
                        .resolve(reference, true, Some(UNPARSEABLE_ACK_CODE), Some(UNPARSEABLE_ACK_TEXT))
                        .await;
                }
                return Err(e.into());
            }
        };

        let Some(reference) = report.message_reference.clone().or_else(|| envelope.user_reference.clone()) else {
            warn!(
                sequence = envelope.sequence_number(),
                "Acknowledgment carries no message reference"
            );
            return Ok(InboundDisposition::Acknowledgment {
                envelope,
                reconciliation,
                report,
                resolution: ResolveDisposition::Unknown,
            });
        };

        let resolution = if report.is_ack {
            self.correlator.resolve(&reference, false, None, None).await
        } else {
            let text = report.text.as_deref().unwrap_or(&report.description);
            self.correlator.resolve(&reference, true, report.code.as_deref(), Some(text)).await
        };

        Ok(InboundDisposition::Acknowledgment {
            envelope,
            reconciliation,
            report,
            resolution,
        })
    }

    /// Reconcile both live counters, e.g. after a session re-login
    pub async fn reconcile(
        &self,
        current_input: SequenceNumber,
        current_output: SequenceNumber,
    ) -> SessionResult<ReconciliationResult> {
        self.reconciler.reconcile(current_input, current_output).await
    }

    pub async fn health(&self) -> SessionHealth {
        self.health.snapshot().await
    }

    pub async fn reset_health(&self) -> SessionResult<SessionHealth> {
        self.health.reset().await
    }

    /// Swap the reject-code dictionary; returns the number of codes loaded
    pub fn reload_reject_codes(&self, path: &Path) -> SessionResult<usize> {
        Ok(self.classifier.reload_from_file(path)?)
    }

    /// Start the background sweeper at the configured interval
    pub fn spawn_maintenance(&self) -> MaintenanceHandle {
        spawn_maintenance(self.duplicates.clone(), self.correlator.clone(), self.sweep_interval)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn correlator(&self) -> &AckCorrelator {
        &self.correlator
    }

    pub fn duplicates(&self) -> &DuplicateStore {
        &self.duplicates
    }

    pub fn reconciler(&self) -> &SequenceReconciler {
        &self.reconciler
    }

    pub fn trailer(&self) -> &TrailerService {
        &self.trailer
    }

    pub fn classifier(&self) -> &RejectCodeClassifier {
        &self.classifier
    }
}
