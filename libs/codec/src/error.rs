//! Protocol-level errors for SWIFT message processing
//!
//! Each variant carries enough context to tell a framing problem apart from
//! an integrity problem. Integrity failures on the trailer itself are not
//! errors here: they are reported through [`crate::TrailerValidation`] so
//! callers can never confuse tampering with a parse error.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// Block structure `{id:content}` could not be parsed
    #[error("Malformed block at byte {offset}: {reason} (message: {message_size} bytes)")]
    MalformedBlock {
        offset: usize,
        reason: String,
        message_size: usize,
    },

    /// A block required by the operation is absent
    #[error("Missing block {block}: {context}")]
    MissingBlock { block: String, context: String },

    /// Basic header (block 1) does not follow the fixed layout
    #[error("Invalid basic header '{header}': {reason}")]
    InvalidBasicHeader { header: String, reason: String },

    /// A mandatory tag or field is absent
    #[error("Missing field {field} in {location}")]
    MissingField { field: String, location: String },

    /// Acknowledgment payload cannot be interpreted
    #[error("Malformed acknowledgment: {reason}")]
    MalformedAcknowledgment { reason: String },

    /// Resend request does not follow the tag=value layout
    #[error("Invalid resend request: {reason}")]
    InvalidResendRequest { reason: String },

    /// Tag=value checksum (tag 10) does not match the message bytes
    #[error("Checksum mismatch: expected {expected:03}, calculated {calculated:03} (message: {message_size} bytes)")]
    ChecksumMismatch {
        expected: u8,
        calculated: u8,
        message_size: usize,
    },

    /// Reject code dictionary could not be loaded
    #[error("Reject dictionary error ({source_name}): {reason}")]
    Dictionary { source_name: String, reason: String },

    /// Authentication key unusable for the keyed digest
    #[error("Invalid authentication key: {reason}")]
    InvalidKey { reason: String },

    /// Message user reference (tag 108) differs from the id the caller correlates on
    #[error("Message reference mismatch: expected '{expected}', message carries '{found}'")]
    ReferenceMismatch { expected: String, found: String },
}

impl ProtocolError {
    pub fn malformed_block(offset: usize, reason: impl Into<String>, message_size: usize) -> Self {
        Self::MalformedBlock {
            offset,
            reason: reason.into(),
            message_size,
        }
    }

    pub fn missing_block(block: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingBlock {
            block: block.into(),
            context: context.into(),
        }
    }

    pub fn invalid_basic_header(header: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBasicHeader {
            header: header.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>, location: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            location: location.into(),
        }
    }

    pub fn malformed_acknowledgment(reason: impl Into<String>) -> Self {
        Self::MalformedAcknowledgment {
            reason: reason.into(),
        }
    }

    pub fn invalid_resend_request(reason: impl Into<String>) -> Self {
        Self::InvalidResendRequest {
            reason: reason.into(),
        }
    }

    pub fn reference_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ReferenceMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn dictionary(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Dictionary {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
