//! Session Health Metrics
//!
//! Cumulative counters shared by the reconciliation engine, the duplicate
//! store and the acknowledgment correlator. Counters only grow; an explicit
//! administrative reset is the single way back to zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHealth {
    /// Missing sequence numbers detected (input gaps and output anomalies)
    pub total_gap_count: u64,
    /// Resend requests dispatched to the counterparty
    pub total_resend_count: u64,
    /// Inbound messages whose business reference was already registered
    pub total_duplicate_count: u64,
    pub last_gap_detected_at: Option<DateTime<Utc>>,
    pub last_resend_requested_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub resend_failure_count: u64,
    #[serde(default)]
    pub output_anomaly_count: u64,
    #[serde(default)]
    pub integrity_failure_count: u64,
    #[serde(default)]
    pub ack_timeout_count: u64,
    #[serde(default)]
    pub rejection_count: u64,
    #[serde(default)]
    pub persistence_failure_count: u64,
    #[serde(default)]
    pub last_reset_at: Option<DateTime<Utc>>,
}

impl SessionHealth {
    /// True when any failure counter is non-zero
    pub fn has_failures(&self) -> bool {
        self.resend_failure_count > 0
            || self.integrity_failure_count > 0
            || self.ack_timeout_count > 0
            || self.rejection_count > 0
            || self.persistence_failure_count > 0
    }
}
