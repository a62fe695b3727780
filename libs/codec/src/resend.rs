//! Resend Request Encoding
//!
//! A resend request asks the counterparty to retransmit an inclusive range
//! of sequence numbers. It is a tag=value session message of type `2`:
//!
//! ```text
//! 8=FIXT.1.1|9=<len>|35=2|49=<sender>|56=<target>|34=<seq>|52=<time>|7=<begin>|16=<end>|10=<sum>|
//! ```
//!
//! `|` stands for the SOH (0x01) delimiter. Body length (tag 9) counts the
//! bytes after the `9=` field up to and including the delimiter before
//! `10=`; the checksum (tag 10) is the byte sum modulo 256 of everything
//! before `10=`, rendered as three digits.

use crate::error::{ProtocolError, ProtocolResult};
use crate::validation::tag_value_checksum;
use chrono::{DateTime, Utc};
use types::{SequenceGap, SequenceNumber};

/// Field delimiter
pub const SOH: u8 = 0x01;
/// Message type of a resend request
pub const MSG_TYPE_RESEND_REQUEST: &str = "2";
pub const BEGIN_STRING: &str = "FIXT.1.1";

const SENDING_TIME_FORMAT: &str = "%Y%m%d-%H:%M:%S%.3f";

/// Range requested for retransmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendRequest {
    pub begin_seq_no: SequenceNumber,
    pub end_seq_no: SequenceNumber,
}

impl ResendRequest {
    pub fn new(begin_seq_no: SequenceNumber, end_seq_no: SequenceNumber) -> ProtocolResult<Self> {
        if begin_seq_no == 0 || end_seq_no < begin_seq_no {
            return Err(ProtocolError::invalid_resend_request(format!(
                "invalid range {}..={}",
                begin_seq_no, end_seq_no
            )));
        }
        Ok(Self {
            begin_seq_no,
            end_seq_no,
        })
    }

    pub fn gap_size(&self) -> u64 {
        self.end_seq_no - self.begin_seq_no + 1
    }

    /// Parse and verify an encoded resend request
    pub fn parse(data: &[u8]) -> ProtocolResult<Self> {
        let checksum_pos = find_checksum_field(data)
            .ok_or_else(|| ProtocolError::invalid_resend_request("missing checksum field (10)"))?;

        let fields = split_fields(data)?;
        let claimed = field(&fields, "10")?
            .parse::<u8>()
            .map_err(|_| ProtocolError::invalid_resend_request("checksum field is not a number in 0..=255"))?;
        let calculated = tag_value_checksum(&data[..checksum_pos]);
        if claimed != calculated {
            return Err(ProtocolError::ChecksumMismatch {
                expected: claimed,
                calculated,
                message_size: data.len(),
            });
        }

        let msg_type = field(&fields, "35")?;
        if msg_type != MSG_TYPE_RESEND_REQUEST {
            return Err(ProtocolError::invalid_resend_request(format!(
                "message type '{}' is not a resend request",
                msg_type
            )));
        }

        let begin = parse_seq(field(&fields, "7")?, "7")?;
        let end = parse_seq(field(&fields, "16")?, "16")?;
        Self::new(begin, end)
    }
}

impl TryFrom<SequenceGap> for ResendRequest {
    type Error = ProtocolError;

    fn try_from(gap: SequenceGap) -> ProtocolResult<Self> {
        Self::new(gap.expected_from, gap.expected_to)
    }
}

/// Builds resend requests for one session direction
#[derive(Debug, Clone)]
pub struct ResendRequestBuilder {
    sender: String,
    target: String,
}

impl ResendRequestBuilder {
    pub fn new(sender: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            target: target.into(),
        }
    }

    /// Encode a request with the given header sequence number and sending time
    pub fn build(&self, request: ResendRequest, msg_seq_num: SequenceNumber, sending_time: DateTime<Utc>) -> Vec<u8> {
        let mut body = Vec::with_capacity(96);
        push_field(&mut body, "35", MSG_TYPE_RESEND_REQUEST);
        push_field(&mut body, "49", &self.sender);
        push_field(&mut body, "56", &self.target);
        push_field(&mut body, "34", &msg_seq_num.to_string());
        push_field(&mut body, "52", &sending_time.format(SENDING_TIME_FORMAT).to_string());
        push_field(&mut body, "7", &request.begin_seq_no.to_string());
        push_field(&mut body, "16", &request.end_seq_no.to_string());

        let mut message = Vec::with_capacity(body.len() + 32);
        push_field(&mut message, "8", BEGIN_STRING);
        push_field(&mut message, "9", &body.len().to_string());
        message.extend_from_slice(&body);

        let checksum = tag_value_checksum(&message);
        push_field(&mut message, "10", &format!("{:03}", checksum));
        message
    }
}

fn push_field(buf: &mut Vec<u8>, tag: &str, value: &str) {
    buf.extend_from_slice(tag.as_bytes());
    buf.push(b'=');
    buf.extend_from_slice(value.as_bytes());
    buf.push(SOH);
}

/// Offset of the `10=` field, which must be preceded by a delimiter
fn find_checksum_field(data: &[u8]) -> Option<usize> {
    data.windows(4)
        .rposition(|w| w[0] == SOH && &w[1..] == b"10=")
        .map(|i| i + 1)
}

fn split_fields(data: &[u8]) -> ProtocolResult<Vec<(&str, &str)>> {
    let text = std::str::from_utf8(data)
        .map_err(|_| ProtocolError::invalid_resend_request("message is not valid UTF-8"))?;
    text.split(SOH as char)
        .filter(|f| !f.is_empty())
        .map(|f| {
            f.split_once('=')
                .ok_or_else(|| ProtocolError::invalid_resend_request(format!("field '{}' has no '='", f)))
        })
        .collect()
}

fn field<'a>(fields: &[(&str, &'a str)], tag: &str) -> ProtocolResult<&'a str> {
    fields
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, v)| *v)
        .ok_or_else(|| ProtocolError::missing_field(tag, "resend request"))
}

fn parse_seq(value: &str, tag: &str) -> ProtocolResult<SequenceNumber> {
    value
        .parse::<SequenceNumber>()
        .map_err(|_| ProtocolError::invalid_resend_request(format!("tag {} value '{}' is not a sequence number", tag, value)))
}
