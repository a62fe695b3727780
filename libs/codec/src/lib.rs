//! # SWIFT Session Codec
//!
//! ## Purpose
//!
//! The "rules" layer of the session engine: everything that reads or
//! writes bytes on the wire, with no I/O and no state.
//!
//! - **Block parsing**: top-level `{id:content}` blocks, basic header
//!   sequence numbers, user and business references
//! - **Integrity trailer**: checksum + keyed authentication code in block 5
//! - **Resend requests**: tag=value message type `2` naming a gap range
//! - **Acknowledgments**: ACK/NAK field extraction and reject-code
//!   classification against a hot-reloadable dictionary
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → [codec] → libs/session
//!     ↑           ↓            ↓
//! Pure Data   Wire Rules   State machines
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Transport or socket handling (belongs in network/)
//! - Durable state (belongs in state/ and session/)
//! - MT field semantics or ISO 20022 schema validation

pub mod ack;
pub mod block;
pub mod error;
pub mod reject;
pub mod resend;
pub mod trailer;
pub mod validation;

pub use ack::{is_acknowledgment, parse_acknowledgment, AcknowledgmentFields};
pub use block::{split_blocks, BasicHeader, Block, MessageEnvelope};
pub use error::{ProtocolError, ProtocolResult};
pub use reject::{AckReport, RejectCodeClassifier, RejectCodeDictionary};
pub use resend::{ResendRequest, ResendRequestBuilder};
pub use trailer::{strip_trailer, IntegrityFailure, Trailer, TrailerService, TrailerValidation};
pub use validation::BilateralKey;
