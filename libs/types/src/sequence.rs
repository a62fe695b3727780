//! Sequence Tracking Types
//!
//! Counter pair, gap ranges and the outcome of a reconciliation pass.

use crate::SequenceNumber;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Last accepted input and last sent output sequence for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub input_sequence: SequenceNumber,
    pub output_sequence: SequenceNumber,
}

impl SessionCounters {
    pub fn new(input_sequence: SequenceNumber, output_sequence: SequenceNumber) -> Self {
        Self {
            input_sequence,
            output_sequence,
        }
    }

    /// Next input sequence the session expects to accept
    pub fn expected_input(&self) -> SequenceNumber {
        self.input_sequence.saturating_add(1)
    }

    /// Merge an observation without ever moving a counter backwards
    pub fn advanced_to(&self, input: SequenceNumber, output: SequenceNumber) -> Self {
        Self {
            input_sequence: self.input_sequence.max(input),
            output_sequence: self.output_sequence.max(output),
        }
    }
}

/// Inclusive range of missing sequence numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceGap {
    pub expected_from: SequenceNumber,
    pub expected_to: SequenceNumber,
}

impl SequenceGap {
    /// Gap between the last accepted number and a newly observed one.
    ///
    /// Returns `None` when `observed` directly follows `last` or is not ahead of it.
    pub fn between(last: SequenceNumber, observed: SequenceNumber) -> Option<Self> {
        let expected = last.checked_add(1)?;
        if observed > expected {
            Some(Self {
                expected_from: expected,
                expected_to: observed - 1,
            })
        } else {
            None
        }
    }

    /// Number of missing messages in the range
    pub fn len(&self) -> u64 {
        self.expected_to
            .saturating_sub(self.expected_from)
            .saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        self.expected_to < self.expected_from
    }
}

impl fmt::Display for SequenceGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.expected_from, self.expected_to)
    }
}

/// Action taken by a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryAction {
    /// Counters were consistent with the checkpoint
    None,
    /// No checkpoint existed; the observed counters became the checkpoint
    Initialized,
    /// An input gap was found and a resend request was dispatched
    ResendRequested,
    /// Output counter jumped; recorded but not recoverable from the counterparty
    OutputAnomalyFlagged,
}

/// Result of reconciling observed counters against the durable checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub gap_detected: bool,
    pub missing_range: Option<SequenceGap>,
    pub output_anomaly: Option<SequenceGap>,
    pub recovery_action: RecoveryAction,
    /// Counters persisted at the end of the pass
    pub counters: SessionCounters,
}

impl ReconciliationResult {
    pub fn consistent(counters: SessionCounters) -> Self {
        Self {
            gap_detected: false,
            missing_range: None,
            output_anomaly: None,
            recovery_action: RecoveryAction::None,
            counters,
        }
    }

    pub fn initialized(counters: SessionCounters) -> Self {
        Self {
            recovery_action: RecoveryAction::Initialized,
            ..Self::consistent(counters)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_between() {
        assert_eq!(SequenceGap::between(10, 11), None);
        assert_eq!(SequenceGap::between(10, 10), None);
        assert_eq!(SequenceGap::between(10, 3), None);

        let gap = SequenceGap::between(10, 13).unwrap();
        assert_eq!(gap.expected_from, 11);
        assert_eq!(gap.expected_to, 12);
        assert_eq!(gap.len(), 2);
        assert_eq!(gap.to_string(), "[11, 12]");
    }

    #[test]
    fn test_gap_at_numeric_limit() {
        assert_eq!(SequenceGap::between(u64::MAX, u64::MAX), None);
    }

    #[test]
    fn test_counters_never_move_backwards() {
        let counters = SessionCounters::new(10, 20);
        let merged = counters.advanced_to(5, 25);
        assert_eq!(merged, SessionCounters::new(10, 25));
        assert_eq!(merged.expected_input(), 11);
    }
}
