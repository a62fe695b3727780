//! Reject Code Dictionary
//!
//! Loaded from TOML:
//!
//! ```toml
//! [[codes]]
//! code = "T27"
//! description = "Invalid BIC"
//! remediation = "Correct the BIC against the directory and resubmit"
//! # category and terminal default from the leading letter
//! ```
//!
//! The built-in table is an illustrative subset; deployments should supply
//! the complete network taxonomy through a dictionary file.

use crate::error::{ProtocolError, ProtocolResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use types::{RejectCategory, RejectCodeDefinition};

#[derive(Debug, Deserialize)]
struct DictionaryFile {
    #[serde(default)]
    codes: Vec<DictionaryEntry>,
}

#[derive(Debug, Deserialize)]
struct DictionaryEntry {
    code: String,
    description: String,
    category: Option<RejectCategory>,
    terminal: Option<bool>,
    #[serde(default)]
    remediation: String,
}

/// Immutable code table; swapped as a whole on reload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RejectCodeDictionary {
    entries: HashMap<String, RejectCodeDefinition>,
}

impl RejectCodeDictionary {
    pub fn new(definitions: impl IntoIterator<Item = RejectCodeDefinition>) -> Self {
        let entries = definitions
            .into_iter()
            .map(|d| (d.code.to_ascii_uppercase(), d))
            .collect();
        Self { entries }
    }

    /// Illustrative subset covering every category
    pub fn builtin() -> Self {
        Self::new([
            RejectCodeDefinition::new("T13", "Invalid date or time", "Correct the date field format (YYMMDD) and resubmit"),
            RejectCodeDefinition::new("T27", "Invalid BIC", "Correct the BIC against the directory and resubmit"),
            RejectCodeDefinition::new("T33", "Field not allowed or sub-field format error", "Fix the field content per the message standard"),
            RejectCodeDefinition::new("T52", "Invalid currency code", "Use an ISO 4217 currency code"),
            RejectCodeDefinition::new("H21", "Invalid header", "Rebuild the basic and application headers"),
            RejectCodeDefinition::new("H25", "Invalid session number", "Re-establish the session before resubmitting"),
            RejectCodeDefinition::new("C02", "Conditional field rule violated", "Check the conditional rules for the message type"),
            RejectCodeDefinition::new("N01", "Network busy", "Retry with backoff"),
            RejectCodeDefinition::new("N02", "System temporarily unavailable", "Retry with backoff"),
            RejectCodeDefinition::new("Y01", "Service not available for receiver", "Retry later or contact the receiver"),
            RejectCodeDefinition::new("D01", "Delivery delayed", "Retry after the delivery window"),
            RejectCodeDefinition::new("D02", "Receiver not reachable", "Retry after a delay; escalate if persistent"),
            RejectCodeDefinition::new("S01", "Authentication failure", "Verify the bilateral key; do not retry automatically"),
            RejectCodeDefinition::new("S02", "Invalid MAC", "Check key rotation status with the counterparty"),
            RejectCodeDefinition::new("S03", "Key expired", "Exchange new bilateral keys before resubmitting"),
            RejectCodeDefinition::new("B01", "Cutoff time passed", "Resubmit on the next business day"),
            RejectCodeDefinition::new("B02", "Amount exceeds limit", "Resubmit once the limit is raised or split the amount"),
        ])
    }

    pub fn from_toml_str(toml_str: &str, source_name: &str) -> ProtocolResult<Self> {
        let file: DictionaryFile =
            toml::from_str(toml_str).map_err(|e| ProtocolError::dictionary(source_name, e.to_string()))?;

        let mut definitions = Vec::with_capacity(file.codes.len());
        for entry in file.codes {
            validate_code(&entry.code).map_err(|reason| ProtocolError::dictionary(source_name, reason))?;
            let category = entry.category.unwrap_or_else(|| RejectCategory::from_code(&entry.code));
            definitions.push(RejectCodeDefinition {
                code: entry.code.to_ascii_uppercase(),
                description: entry.description,
                category,
                terminal: entry.terminal.unwrap_or_else(|| category.is_terminal()),
                remediation: entry.remediation,
            });
        }
        Ok(Self::new(definitions))
    }

    pub fn from_file(path: &Path) -> ProtocolResult<Self> {
        let source_name = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProtocolError::dictionary(&source_name, format!("read failed: {}", e)))?;
        Self::from_toml_str(&content, &source_name)
    }

    pub fn get(&self, code: &str) -> Option<&RejectCodeDefinition> {
        self.entries.get(&code.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Category letter followed by two digits
fn validate_code(code: &str) -> Result<(), String> {
    let bytes = code.as_bytes();
    let well_formed = bytes.len() == 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1].is_ascii_digit()
        && bytes[2].is_ascii_digit();
    if well_formed {
        Ok(())
    } else {
        Err(format!("code '{}' must be a letter followed by two digits", code))
    }
}
