//! # Session Engine Types
//!
//! Data model shared by every crate of the SWIFT session resilience engine.
//!
//! ## Design Philosophy
//!
//! - **Durable by default**: every record that crosses a restart derives
//!   `Serialize`/`Deserialize` and is stored as JSON by the state layer
//! - **Explicit terminal states**: acknowledgment outcomes and reject
//!   classifications are enums, never stringly-typed flags
//! - **No behaviour**: types here validate their own invariants only; the
//!   state machines live in the `session` crate
//!
//! ## Modules
//!
//! - [`sequence`]: session counters, gap ranges, reconciliation results
//! - [`health`]: cumulative session health metrics
//! - [`duplicate`]: duplicate detection records
//! - [`acknowledgment`]: pending acknowledgment records and outcomes
//! - [`reject`]: reject code definitions, categories and severities

pub mod acknowledgment;
pub mod duplicate;
pub mod health;
pub mod reject;
pub mod sequence;

pub use acknowledgment::{AckOutcome, AckState, PendingAckRecord, RejectDetails};
pub use duplicate::{DuplicateCheck, DuplicateRecord};
pub use health::SessionHealth;
pub use reject::{RejectCategory, RejectCodeDefinition, Severity};
pub use sequence::{ReconciliationResult, RecoveryAction, SequenceGap, SessionCounters};

/// Sequence numbers used by the session layer
pub type SequenceNumber = u64;
