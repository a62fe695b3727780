//! Store Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error on '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored bytes fail their integrity check
    #[error("Corrupted record '{key}': {reason}")]
    Corrupted { key: String, reason: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }

    pub fn serialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.into(),
            source,
        }
    }

    pub fn corrupted(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupted {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
