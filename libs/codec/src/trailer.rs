//! Integrity Trailer Service
//!
//! Appends and validates block 5:
//!
//! ```text
//! <body>{5:{MAC:XXXXXXXX}{CHK:XXXXXXXXXXXX}}
//! ```
//!
//! Both values are computed over the body with any previous trailer
//! removed, so `validate(append(body))` always succeeds. A checksum
//! mismatch means corruption; an authentication mismatch with a valid
//! checksum means a wrong or rotated key, or tampering by someone able to
//! recompute the checksum. The two are reported separately.

use crate::block::sub_tag;
use crate::error::ProtocolResult;
use crate::validation::{
    authentication_code, trailer_checksum, verify_authentication_code, verify_trailer_checksum, BilateralKey,
};
use std::fmt;
use tracing::debug;

const TRAILER_OPEN: &str = "{5:";

/// Why a trailer failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityFailure {
    /// No block 5 at the end of the message
    MissingTrailer,
    /// Block 5 present but without well-formed MAC and CHK
    MalformedTrailer,
    /// Recomputed checksum differs: the body was altered or corrupted
    ChecksumMismatch,
    /// Checksum matches but the keyed code does not: wrong key or tampering
    AuthenticationMismatch,
}

impl IntegrityFailure {
    /// Failures that point at a key problem or an active attacker
    pub fn is_security_relevant(&self) -> bool {
        matches!(self, Self::AuthenticationMismatch)
    }
}

impl fmt::Display for IntegrityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingTrailer => "trailer block missing",
            Self::MalformedTrailer => "trailer block malformed",
            Self::ChecksumMismatch => "checksum mismatch",
            Self::AuthenticationMismatch => "authentication code mismatch",
        };
        f.write_str(text)
    }
}

/// Outcome of [`TrailerService::validate_trailer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailerValidation {
    pub valid: bool,
    pub reason: Option<IntegrityFailure>,
}

impl TrailerValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn failed(reason: IntegrityFailure) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Values carried by a trailer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    pub checksum: String,
    pub authentication_code: String,
}

impl Trailer {
    pub fn render(&self) -> String {
        format!("{{5:{{MAC:{}}}{{CHK:{}}}}}", self.authentication_code, self.checksum)
    }
}

/// Computes and verifies trailers under one bilateral key
#[derive(Debug, Clone)]
pub struct TrailerService {
    key: BilateralKey,
}

impl TrailerService {
    pub fn new(key: BilateralKey) -> Self {
        Self { key }
    }

    /// Trailer for a body that carries no trailer of its own
    pub fn compute(&self, body: &str) -> ProtocolResult<Trailer> {
        Ok(Trailer {
            checksum: trailer_checksum(body.as_bytes()),
            authentication_code: authentication_code(&self.key, body.as_bytes())?,
        })
    }

    /// Strip any existing trailer and append a fresh one
    pub fn append_trailer(&self, message: &str) -> ProtocolResult<String> {
        let body = strip_trailer(message);
        let trailer = self.compute(body)?;
        let mut out = String::with_capacity(body.len() + 40);
        out.push_str(body);
        out.push_str(&trailer.render());
        Ok(out)
    }

    /// Recompute both values over the body and compare with the claimed ones
    pub fn validate_trailer(&self, message: &str) -> ProtocolResult<TrailerValidation> {
        let (body, block) = match split_trailer(message) {
            Some(parts) => parts,
            None if message.contains(TRAILER_OPEN) => {
                return Ok(TrailerValidation::failed(IntegrityFailure::MalformedTrailer))
            }
            None => return Ok(TrailerValidation::failed(IntegrityFailure::MissingTrailer)),
        };

        let (claimed_mac, claimed_chk) = match (sub_tag(block, "MAC"), sub_tag(block, "CHK")) {
            (Some(mac), Some(chk)) => (mac, chk),
            _ => return Ok(TrailerValidation::failed(IntegrityFailure::MalformedTrailer)),
        };

        if !verify_trailer_checksum(body.as_bytes(), claimed_chk) {
            debug!(body_len = body.len(), "Trailer checksum mismatch");
            return Ok(TrailerValidation::failed(IntegrityFailure::ChecksumMismatch));
        }

        if !verify_authentication_code(&self.key, body.as_bytes(), claimed_mac)? {
            debug!(body_len = body.len(), "Trailer authentication code mismatch");
            return Ok(TrailerValidation::failed(IntegrityFailure::AuthenticationMismatch));
        }

        Ok(TrailerValidation::ok())
    }
}

/// Message without its trailing block 5; unchanged when none is present
pub fn strip_trailer(message: &str) -> &str {
    split_trailer(message).map(|(body, _)| body).unwrap_or(message)
}

/// Split a message into body and block 5 content.
///
/// The trailer is the last `{5:` whose remainder is a run of `{tag:value}`
/// sub-blocks closed by `}` at the very end of the message.
fn split_trailer(message: &str) -> Option<(&str, &str)> {
    let start = message.rfind(TRAILER_OPEN)?;
    let content = &message[start + TRAILER_OPEN.len()..];
    let inner = content.strip_suffix('}')?;
    if is_sub_block_run(inner) {
        Some((&message[..start], inner))
    } else {
        None
    }
}

/// `{tag:value}{tag:value}...` with alphanumeric tags and brace-free values
fn is_sub_block_run(mut rest: &str) -> bool {
    while !rest.is_empty() {
        let Some(body) = rest.strip_prefix('{') else {
            return false;
        };
        let Some(close) = body.find('}') else {
            return false;
        };
        let entry = &body[..close];
        let Some((tag, value)) = entry.split_once(':') else {
            return false;
        };
        if tag.is_empty() || !tag.bytes().all(|b| b.is_ascii_alphanumeric()) || value.contains('{') {
            return false;
        }
        rest = &body[close + 1..];
    }
    true
}
