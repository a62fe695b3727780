//! Duplicate Detection Records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Durable record of a business reference seen on the inbound path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRecord {
    pub business_reference: String,
    /// Transport message id of the first sighting
    pub message_id: String,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    /// Repeat sightings after the first one
    pub duplicate_count: u64,
}

impl DuplicateRecord {
    pub fn first_sighting(
        business_reference: impl Into<String>,
        message_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            business_reference: business_reference.into(),
            message_id: message_id.into(),
            first_seen_at: now,
            last_seen_at: now,
            duplicate_count: 0,
        }
    }

    /// Register another sighting of the same reference
    pub fn record_repeat(&mut self, now: DateTime<Utc>) {
        self.duplicate_count = self.duplicate_count.saturating_add(1);
        if now > self.last_seen_at {
            self.last_seen_at = now;
        }
    }

    /// Whether the record has outlived the retention window
    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        now.signed_duration_since(self.first_seen_at) >= retention
    }
}

/// Answer returned by a duplicate check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    pub first_seen_at: DateTime<Utc>,
    pub duplicate_count: u64,
}

impl From<&DuplicateRecord> for DuplicateCheck {
    fn from(record: &DuplicateRecord) -> Self {
        Self {
            is_duplicate: record.duplicate_count > 0,
            first_seen_at: record.first_seen_at,
            duplicate_count: record.duplicate_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_repeat_and_expiry() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut record = DuplicateRecord::first_sighting("REF1", "MSG1", t0);
        assert!(!DuplicateCheck::from(&record).is_duplicate);

        record.record_repeat(t0 + Duration::hours(1));
        let check = DuplicateCheck::from(&record);
        assert!(check.is_duplicate);
        assert_eq!(check.duplicate_count, 1);
        assert_eq!(record.last_seen_at, t0 + Duration::hours(1));

        let retention = Duration::hours(72);
        assert!(!record.is_expired(t0 + Duration::hours(71), retention));
        assert!(record.is_expired(t0 + Duration::hours(72), retention));
    }
}
