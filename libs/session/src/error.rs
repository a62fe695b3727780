//! Session Error Types

use codec::{IntegrityFailure, ProtocolError};
use network::TransportError;
use state::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Trailer did not verify; the message must not be processed or retried
    #[error("Integrity failure: {reason}")]
    Integrity { reason: IntegrityFailure },

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Message '{message_id}' already has a pending acknowledgment")]
    AlreadyPending { message_id: String },

    /// The pending entry was withdrawn before it resolved
    #[error("Pending acknowledgment for '{message_id}' was abandoned")]
    Abandoned { message_id: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

impl SessionError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Errors that must reach a human rather than an automatic retry
    pub fn is_security_relevant(&self) -> bool {
        matches!(self, Self::Integrity { reason } if reason.is_security_relevant())
    }
}
