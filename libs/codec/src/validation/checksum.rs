//! Message Checksums
//!
//! Two unkeyed digests live here:
//! - the trailer `CHK`: the first six bytes of SHA-256 over the message body,
//!   rendered as twelve uppercase hex characters
//! - the tag=value checksum (tag 10): byte sum modulo 256, used by resend requests

use sha2::{Digest, Sha256};

/// Bytes of the SHA-256 digest kept in the trailer checksum
pub const TRAILER_CHECKSUM_BYTES: usize = 6;

/// Trailer checksum (`CHK`) over a message body
pub fn trailer_checksum(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    hex::encode_upper(&digest[..TRAILER_CHECKSUM_BYTES])
}

/// Verify a claimed trailer checksum byte-for-byte
pub fn verify_trailer_checksum(body: &[u8], claimed: &str) -> bool {
    trailer_checksum(body).as_bytes() == claimed.as_bytes()
}

/// Tag=value checksum: sum of all bytes modulo 256
pub fn tag_value_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailer_checksum_shape() {
        let chk = trailer_checksum(b"{1:F01BANKBEBBAXXX0001000001}");
        assert_eq!(chk.len(), 12);
        assert!(chk.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));

        // Deterministic, and sensitive to a single changed byte
        assert_eq!(chk, trailer_checksum(b"{1:F01BANKBEBBAXXX0001000001}"));
        assert_ne!(chk, trailer_checksum(b"{1:F01BANKBEBBAXXX0001000002}"));
    }

    #[test]
    fn test_verify_is_byte_exact() {
        let chk = trailer_checksum(b"body");
        assert!(verify_trailer_checksum(b"body", &chk));
        assert!(!verify_trailer_checksum(b"body", &chk.to_lowercase()));
        assert!(!verify_trailer_checksum(b"Body", &chk));
    }

    #[test]
    fn test_tag_value_checksum() {
        assert_eq!(tag_value_checksum(b""), 0);
        assert_eq!(tag_value_checksum(&[200, 100]), 44);
        assert_eq!(tag_value_checksum(b"8=FIX.4.4\x01"), {
            let sum: u32 = b"8=FIX.4.4\x01".iter().map(|b| *b as u32).sum();
            (sum % 256) as u8
        });
    }
}
