//! Reject Code Taxonomy
//!
//! Codes are three characters: a category letter followed by two digits
//! (`T27`, `S02`, ...). The letter decides the category when a dictionary
//! entry does not state one explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error category of a negative acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectCategory {
    /// Text, header or field validation errors; fix the message
    Validation,
    /// Network or system errors; usually transient
    Network,
    /// Delivery errors; retry after a delay
    Delivery,
    /// Security and authentication errors; never retried automatically
    Security,
    /// Business rule errors; retry once the triggering condition changes
    BusinessRule,
    /// Code missing from the dictionary
    Unknown,
}

impl RejectCategory {
    /// Category implied by the leading letter of a reject code
    pub fn from_code(code: &str) -> Self {
        match code.chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('T') | Some('H') | Some('C') => Self::Validation,
            Some('N') | Some('Y') => Self::Network,
            Some('D') => Self::Delivery,
            Some('S') => Self::Security,
            Some('B') => Self::BusinessRule,
            _ => Self::Unknown,
        }
    }

    /// Whether errors of this category must never be retried automatically
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Validation | Self::Security | Self::Unknown => true,
            Self::Network | Self::Delivery | Self::BusinessRule => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::Network => "NETWORK",
            Self::Delivery => "DELIVERY",
            Self::Security => "SECURITY",
            Self::BusinessRule => "BUSINESS_RULE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RejectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity reported alongside a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Terminal rejections are errors, retryable ones warnings
    pub fn for_rejection(terminal: bool) -> Self {
        if terminal {
            Self::Error
        } else {
            Self::Warning
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("INFO"),
            Self::Warning => f.write_str("WARNING"),
            Self::Error => f.write_str("ERROR"),
        }
    }
}

/// One dictionary entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectCodeDefinition {
    pub code: String,
    pub description: String,
    pub category: RejectCategory,
    pub terminal: bool,
    pub remediation: String,
}

impl RejectCodeDefinition {
    /// Entry whose category and terminal flag follow from the code letter
    pub fn new(code: &str, description: &str, remediation: &str) -> Self {
        let category = RejectCategory::from_code(code);
        Self {
            code: code.to_string(),
            description: description.to_string(),
            category,
            terminal: category.is_terminal(),
            remediation: remediation.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_leading_letter() {
        assert_eq!(RejectCategory::from_code("T27"), RejectCategory::Validation);
        assert_eq!(RejectCategory::from_code("h25"), RejectCategory::Validation);
        assert_eq!(RejectCategory::from_code("N02"), RejectCategory::Network);
        assert_eq!(RejectCategory::from_code("D01"), RejectCategory::Delivery);
        assert_eq!(RejectCategory::from_code("S02"), RejectCategory::Security);
        assert_eq!(RejectCategory::from_code("B01"), RejectCategory::BusinessRule);
        assert_eq!(RejectCategory::from_code("Z99"), RejectCategory::Unknown);
        assert_eq!(RejectCategory::from_code(""), RejectCategory::Unknown);
    }

    #[test]
    fn test_terminal_categories() {
        assert!(RejectCategory::Validation.is_terminal());
        assert!(RejectCategory::Security.is_terminal());
        assert!(RejectCategory::Unknown.is_terminal());
        assert!(!RejectCategory::Network.is_terminal());
        assert!(!RejectCategory::Delivery.is_terminal());
        assert!(!RejectCategory::BusinessRule.is_terminal());
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(Severity::for_rejection(true), Severity::Error);
        assert_eq!(Severity::for_rejection(false), Severity::Warning);
        assert_eq!(Severity::Error.to_string(), "ERROR");
    }
}
