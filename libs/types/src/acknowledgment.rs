//! Acknowledgment Correlation Types
//!
//! A pending entry moves `Pending → {Acknowledged | Rejected | TimedOut}`
//! exactly once. Only the registration data is persisted; the outcome is
//! delivered in memory and the durable copy is deleted on resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Durable form of a pending acknowledgment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAckRecord {
    pub message_id: String,
    pub registered_at: DateTime<Utc>,
    pub timeout_ms: u64,
}

impl PendingAckRecord {
    pub fn new(message_id: impl Into<String>, registered_at: DateTime<Utc>, timeout: Duration) -> Self {
        Self {
            message_id: message_id.into(),
            registered_at,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Time spent waiting as of `now`; a clock that moved backwards counts as zero
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.registered_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Budget left before the deadline, `None` once the deadline has passed
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let elapsed = self.elapsed(now);
        let timeout = self.timeout();
        if elapsed >= timeout {
            None
        } else {
            Some(timeout - elapsed)
        }
    }
}

/// Details carried by a negative acknowledgment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectDetails {
    pub code: String,
    pub text: String,
}

/// Terminal outcome of a pending acknowledgment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckOutcome {
    Acknowledged,
    Rejected(RejectDetails),
    /// No response before the deadline; the message may or may not have been processed
    TimedOut,
}

impl AckOutcome {
    pub fn rejected(code: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Rejected(RejectDetails {
            code: code.into(),
            text: text.into(),
        })
    }

    pub fn is_acknowledged(&self) -> bool {
        matches!(self, Self::Acknowledged)
    }
}

impl fmt::Display for AckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acknowledged => write!(f, "ACKNOWLEDGED"),
            Self::Rejected(details) => write!(f, "REJECTED({})", details.code),
            Self::TimedOut => write!(f, "TIMED_OUT"),
        }
    }
}

/// Observable state of a correlation entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckState {
    Pending,
    Resolved(AckOutcome),
}

impl AckState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn outcome(&self) -> Option<&AckOutcome> {
        match self {
            Self::Pending => None,
            Self::Resolved(outcome) => Some(outcome),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_remaining_budget() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let record = PendingAckRecord::new("MUR1", t0, Duration::from_secs(30));

        assert_eq!(
            record.remaining(t0 + chrono::Duration::seconds(12)),
            Some(Duration::from_secs(18))
        );
        assert_eq!(record.remaining(t0 + chrono::Duration::seconds(30)), None);
        // Clock skew backwards never grants extra time
        assert_eq!(
            record.remaining(t0 - chrono::Duration::seconds(5)),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_record_json_shape() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let record = PendingAckRecord::new("MUR1", t0, Duration::from_millis(1500));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["timeout_ms"], 1500);
        assert_eq!(json["message_id"], "MUR1");
    }
}
