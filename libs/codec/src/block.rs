//! Block and Tag Extraction
//!
//! FIN messages are a sequence of `{id:content}` blocks:
//!
//! ```text
//! {1:F01BANKBEBBAXXX0000000123}{2:I103BANKDEFFXXXXN}{3:{108:MUR0001}}{4:
//! :20:REF0001
//! :32A:240301EUR1000,00
//! -}{5:{MAC:0A1B2C3D}{CHK:0123456789AB}}
//! ```
//!
//! Only the handful of fields the session engine needs are interpreted:
//! the basic header sequence number, the message user reference (tag 108),
//! the business reference (field 20, or the ISO 20022 identifiers for MX
//! payloads carried in block 4) and the trailer in block 5. Everything else
//! stays opaque.

use crate::error::{ProtocolError, ProtocolResult};
use types::SequenceNumber;

/// Service identifier of user-to-user messages
pub const SERVICE_USER_MESSAGE: &str = "01";
/// Service identifier of system acknowledgments (ACK/NAK)
pub const SERVICE_ACKNOWLEDGMENT: &str = "21";

/// Length of the basic header content: app(1) service(2) LT(12) session(4) sequence(6)
const BASIC_HEADER_LEN: usize = 25;

/// One top-level block, borrowed from the message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    pub id: &'a str,
    pub content: &'a str,
    /// Byte offset of the opening brace
    pub start: usize,
    /// Byte offset one past the closing brace
    pub end: usize,
}

/// Split a message into its top-level blocks.
///
/// Text blocks (block 4 starting with a line break) end at the `-}`
/// terminator; every other block ends at its matching brace.
pub fn split_blocks(message: &str) -> ProtocolResult<Vec<Block<'_>>> {
    let bytes = message.as_bytes();
    let mut blocks = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => {}
            b'\r' | b'\n' => {
                pos += 1;
                continue;
            }
            _ => {
                return Err(ProtocolError::malformed_block(
                    pos,
                    "expected '{' at block start",
                    bytes.len(),
                ))
            }
        }

        let colon = message[pos..]
            .find(':')
            .map(|i| pos + i)
            .ok_or_else(|| ProtocolError::malformed_block(pos, "block id without ':'", bytes.len()))?;
        let id = &message[pos + 1..colon];
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ProtocolError::malformed_block(
                pos,
                format!("invalid block id '{}'", id),
                bytes.len(),
            ));
        }

        let content_start = colon + 1;
        let rest = &message[content_start..];
        let content_end = if rest.starts_with('\n') || rest.starts_with("\r\n") {
            rest.find("\n-}")
                .map(|i| content_start + i + 2)
                .ok_or_else(|| {
                    ProtocolError::malformed_block(pos, "text block without '-}' terminator", bytes.len())
                })?
        } else {
            matching_brace(bytes, content_start).ok_or_else(|| {
                ProtocolError::malformed_block(pos, "unterminated block", bytes.len())
            })?
        };

        blocks.push(Block {
            id,
            content: &message[content_start..content_end],
            start: pos,
            end: content_end + 1,
        });
        pos = content_end + 1;
    }

    Ok(blocks)
}

/// Offset of the brace closing a block whose content starts at `from`
fn matching_brace(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in bytes.iter().enumerate().skip(from) {
        match b {
            b'{' => depth += 1,
            b'}' if depth == 0 => return Some(i),
            b'}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Find a block by id
pub fn find_block<'a>(blocks: &[Block<'a>], id: &str) -> Option<Block<'a>> {
    blocks.iter().find(|b| b.id == id).copied()
}

/// Value of a `{tag:value}` sub-block directly inside `content`
pub fn sub_tag<'a>(content: &'a str, tag: &str) -> Option<&'a str> {
    let needle = format!("{{{}:", tag);
    let start = content.find(&needle)? + needle.len();
    let end = content[start..].find('}')? + start;
    Some(&content[start..end])
}

/// Value of a `:tag:` field line inside a text block
pub fn text_field<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let needle = format!(":{}:", tag);
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .find_map(|line| line.strip_prefix(needle.as_str()))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Inner text of the first `<element>` in an XML payload
fn xml_element<'a>(payload: &'a str, element: &str) -> Option<&'a str> {
    let open = format!("<{}>", element);
    let close = format!("</{}>", element);
    let start = payload.find(&open)? + open.len();
    let end = payload[start..].find(&close)? + start;
    Some(payload[start..end].trim()).filter(|v| !v.is_empty())
}

/// Parsed basic header (block 1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicHeader {
    pub application_id: char,
    pub service_id: String,
    pub logical_terminal: String,
    pub session_number: u32,
    pub sequence_number: SequenceNumber,
}

impl BasicHeader {
    pub fn parse(content: &str) -> ProtocolResult<Self> {
        if content.len() != BASIC_HEADER_LEN || !content.is_ascii() {
            return Err(ProtocolError::invalid_basic_header(
                content,
                format!("expected {} ASCII characters, got {}", BASIC_HEADER_LEN, content.len()),
            ));
        }

        let application_id = content
            .chars()
            .next()
            .ok_or_else(|| ProtocolError::invalid_basic_header(content, "empty header"))?;
        let service_id = &content[1..3];
        let logical_terminal = &content[3..15];
        let session = &content[15..19];
        let sequence = &content[19..25];

        let session_number = session.parse::<u32>().map_err(|_| {
            ProtocolError::invalid_basic_header(content, format!("session number '{}' is not numeric", session))
        })?;
        let sequence_number = sequence.parse::<SequenceNumber>().map_err(|_| {
            ProtocolError::invalid_basic_header(content, format!("sequence number '{}' is not numeric", sequence))
        })?;

        Ok(Self {
            application_id,
            service_id: service_id.to_string(),
            logical_terminal: logical_terminal.to_string(),
            session_number,
            sequence_number,
        })
    }

    pub fn is_acknowledgment(&self) -> bool {
        self.service_id == SERVICE_ACKNOWLEDGMENT
    }
}

/// The fields of a message the session engine acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    pub basic_header: BasicHeader,
    /// Message user reference, tag 108 in block 3 (or block 4 of an ACK/NAK)
    pub user_reference: Option<String>,
    /// Sender-assigned business reference used for duplicate detection
    pub business_reference: Option<String>,
}

impl MessageEnvelope {
    pub fn parse(message: &str) -> ProtocolResult<Self> {
        let blocks = split_blocks(message)?;
        let header = find_block(&blocks, "1")
            .ok_or_else(|| ProtocolError::missing_block("1", "basic header is mandatory"))?;
        let basic_header = BasicHeader::parse(header.content)?;

        let block3 = find_block(&blocks, "3");
        let block4 = find_block(&blocks, "4");

        let user_reference = block3
            .and_then(|b| sub_tag(b.content, "108"))
            .or_else(|| block4.and_then(|b| sub_tag(b.content, "108")))
            .map(str::to_string);

        let business_reference = block4.and_then(|b| business_reference(b.content)).map(str::to_string);

        Ok(Self {
            basic_header,
            user_reference,
            business_reference,
        })
    }

    pub fn sequence_number(&self) -> SequenceNumber {
        self.basic_header.sequence_number
    }

    pub fn is_acknowledgment(&self) -> bool {
        self.basic_header.is_acknowledgment()
    }
}

/// Business reference of a block 4 payload.
///
/// MT: field 20. MX: `BizMsgIdr` of the business application header, then
/// the document `MsgId`.
pub fn business_reference(block4: &str) -> Option<&str> {
    text_field(block4, "20")
        .or_else(|| xml_element(block4, "BizMsgIdr"))
        .or_else(|| xml_element(block4, "MsgId"))
}
