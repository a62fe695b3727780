//! Reject-Code Classifier
//!
//! Turns an ACK/NAK payload into an [`AckReport`] a caller can act on
//! without knowing the code table: category, severity, whether the error
//! is terminal, and remediation guidance. The engine classifies but never
//! retries.
//!
//! Codes missing from the dictionary are terminal with `Error` severity and
//! `Unknown` category. An unrecognized rejection is never treated as
//! retryable.

pub mod dictionary;

pub use dictionary::RejectCodeDictionary;

use crate::ack::{parse_acknowledgment, AcknowledgmentFields};
use crate::error::ProtocolResult;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use types::{RejectCategory, RejectCodeDefinition, Severity};

const UNKNOWN_DESCRIPTION: &str = "Unrecognized reject code";
const UNKNOWN_REMEDIATION: &str = "Investigate manually; do not retry automatically";

/// Structured view of an acknowledgment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckReport {
    pub is_ack: bool,
    pub is_nack: bool,
    pub code: Option<String>,
    pub description: String,
    pub affected_field: Option<String>,
    pub severity: Severity,
    /// `None` for positive acknowledgments
    pub category: Option<RejectCategory>,
    pub terminal: bool,
    pub remediation: Option<String>,
    /// Free text carried by the payload, if any
    pub text: Option<String>,
    /// User reference of the acknowledged message
    pub message_reference: Option<String>,
}

impl AckReport {
    /// Whether a caller may retry the rejected message with backoff
    pub fn is_retryable(&self) -> bool {
        self.is_nack && !self.terminal
    }
}

/// Classifier with a hot-reloadable dictionary
#[derive(Debug)]
pub struct RejectCodeClassifier {
    dictionary: RwLock<Arc<RejectCodeDictionary>>,
}

impl Default for RejectCodeClassifier {
    fn default() -> Self {
        Self::new(RejectCodeDictionary::builtin())
    }
}

impl RejectCodeClassifier {
    pub fn new(dictionary: RejectCodeDictionary) -> Self {
        Self {
            dictionary: RwLock::new(Arc::new(dictionary)),
        }
    }

    /// Current table; the snapshot stays valid across reloads
    pub fn dictionary(&self) -> Arc<RejectCodeDictionary> {
        Arc::clone(&self.dictionary.read())
    }

    /// Replace the whole table atomically
    pub fn reload(&self, dictionary: RejectCodeDictionary) {
        let count = dictionary.len();
        *self.dictionary.write() = Arc::new(dictionary);
        info!(codes = count, "Reject code dictionary reloaded");
    }

    /// Load a dictionary file and swap it in; the old table stays on failure
    pub fn reload_from_file(&self, path: &Path) -> ProtocolResult<usize> {
        let dictionary = RejectCodeDictionary::from_file(path)?;
        let count = dictionary.len();
        self.reload(dictionary);
        Ok(count)
    }

    /// Definition for a code, falling back to the fail-closed unknown entry
    pub fn classify(&self, code: &str) -> RejectCodeDefinition {
        self.dictionary()
            .get(code)
            .cloned()
            .unwrap_or_else(|| unknown_definition(code))
    }

    /// Parse an ACK/NAK payload and classify its error code
    pub fn parse(&self, raw: &str) -> ProtocolResult<AckReport> {
        let fields = parse_acknowledgment(raw)?;
        Ok(self.report(fields))
    }

    fn report(&self, fields: AcknowledgmentFields) -> AckReport {
        if fields.accepted {
            return AckReport {
                is_ack: true,
                is_nack: false,
                code: None,
                description: "Message accepted".to_string(),
                affected_field: None,
                severity: Severity::Info,
                category: None,
                terminal: false,
                remediation: None,
                text: fields.text,
                message_reference: fields.message_reference,
            };
        }

        let definition = match fields.error_code.as_deref() {
            Some(code) => self.classify(code),
            None => unknown_definition(""),
        };
        let severity = if definition.category == RejectCategory::Unknown {
            Severity::Error
        } else {
            Severity::for_rejection(definition.terminal)
        };

        AckReport {
            is_ack: false,
            is_nack: true,
            code: fields.error_code,
            description: definition.description,
            affected_field: fields.affected_field,
            severity,
            category: Some(definition.category),
            terminal: definition.terminal,
            remediation: Some(definition.remediation),
            text: fields.text,
            message_reference: fields.message_reference,
        }
    }
}

fn unknown_definition(code: &str) -> RejectCodeDefinition {
    RejectCodeDefinition {
        code: code.to_string(),
        description: UNKNOWN_DESCRIPTION.to_string(),
        category: RejectCategory::Unknown,
        terminal: true,
        remediation: UNKNOWN_REMEDIATION.to_string(),
    }
}
