//! Acknowledgment Payload Fields
//!
//! ACK/NAK service messages carry fixed tags in block 4:
//!
//! | tag   | meaning                                                   |
//! |-------|-----------------------------------------------------------|
//! | `451` | `0` accepted, `1` rejected                                |
//! | `405` | error code (three characters) optionally followed by the affected field |
//! | `432` | free-text description                                     |
//! | `108` | message user reference of the acknowledged message        |
//!
//! No error code means a positive acknowledgment.

use crate::block::{find_block, split_blocks, sub_tag, SERVICE_ACKNOWLEDGMENT};
use crate::error::{ProtocolError, ProtocolResult};

const ERROR_CODE_LEN: usize = 3;

/// Raw fields extracted from an ACK/NAK payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcknowledgmentFields {
    pub accepted: bool,
    pub error_code: Option<String>,
    pub affected_field: Option<String>,
    pub text: Option<String>,
    pub message_reference: Option<String>,
}

/// Whether a payload is an ACK/NAK service message
pub fn is_acknowledgment(raw: &str) -> bool {
    let Ok(blocks) = split_blocks(raw) else {
        return false;
    };
    let service_ack = find_block(&blocks, "1")
        .map(|b| b.content.get(1..3) == Some(SERVICE_ACKNOWLEDGMENT))
        .unwrap_or(false);
    service_ack || find_block(&blocks, "4").is_some_and(|b| sub_tag(b.content, "451").is_some())
}

/// Extract the fixed-position fields of an ACK/NAK
pub fn parse_acknowledgment(raw: &str) -> ProtocolResult<AcknowledgmentFields> {
    let blocks = split_blocks(raw).map_err(|e| ProtocolError::malformed_acknowledgment(e.to_string()))?;
    let block4 = find_block(&blocks, "4")
        .ok_or_else(|| ProtocolError::malformed_acknowledgment("no block 4 in acknowledgment"))?;

    let status = sub_tag(block4.content, "451");
    let (error_code, affected_field) = match sub_tag(block4.content, "405").map(str::trim) {
        Some(value) if !value.is_empty() => split_error_code(value)?,
        _ => (None, None),
    };

    let accepted = match status {
        Some("0") => error_code.is_none(),
        Some("1") => false,
        Some(other) => {
            return Err(ProtocolError::malformed_acknowledgment(format!(
                "unexpected status '{}' in tag 451",
                other
            )))
        }
        None if error_code.is_some() => false,
        None => {
            return Err(ProtocolError::malformed_acknowledgment(
                "neither status (451) nor error code (405) present",
            ))
        }
    };

    let text = sub_tag(block4.content, "432")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let message_reference = find_block(&blocks, "3")
        .and_then(|b| sub_tag(b.content, "108"))
        .or_else(|| sub_tag(block4.content, "108"))
        .map(str::to_string);

    Ok(AcknowledgmentFields {
        accepted,
        error_code,
        affected_field,
        text,
        message_reference,
    })
}

fn split_error_code(value: &str) -> ProtocolResult<(Option<String>, Option<String>)> {
    let code = value
        .get(..ERROR_CODE_LEN)
        .ok_or_else(|| ProtocolError::malformed_acknowledgment(format!("error code '{}' is too short", value)))?;
    let affected = value[ERROR_CODE_LEN..].trim_start_matches(':').trim();
    Ok((
        Some(code.to_ascii_uppercase()),
        (!affected.is_empty()).then(|| affected.to_string()),
    ))
}
