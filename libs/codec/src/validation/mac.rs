//! Keyed Authentication Code
//!
//! The trailer `MAC` is the first four bytes of HMAC-SHA256 over the message
//! body under the pre-shared bilateral key, as eight uppercase hex characters.

use crate::error::{ProtocolError, ProtocolResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Bytes of the HMAC output kept in the trailer
pub const TRAILER_MAC_BYTES: usize = 4;

/// Pre-shared bilateral key. Never printed.
#[derive(Clone)]
pub struct BilateralKey(Vec<u8>);

impl BilateralKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> ProtocolResult<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ProtocolError::InvalidKey {
                reason: "bilateral key must not be empty".to_string(),
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for BilateralKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BilateralKey(<{} bytes redacted>)", self.0.len())
    }
}

/// Authentication code over a message body
pub fn authentication_code(key: &BilateralKey, body: &[u8]) -> ProtocolResult<String> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| ProtocolError::InvalidKey {
        reason: e.to_string(),
    })?;
    mac.update(body);
    let tag = mac.finalize().into_bytes();
    Ok(hex::encode_upper(&tag[..TRAILER_MAC_BYTES]))
}

/// Constant-time comparison of a claimed code against the recomputed one
pub fn verify_authentication_code(key: &BilateralKey, body: &[u8], claimed: &str) -> ProtocolResult<bool> {
    let computed = authentication_code(key, body)?;
    if computed.len() != claimed.len() {
        return Ok(false);
    }
    Ok(computed.as_bytes().ct_eq(claimed.as_bytes()).into())
}
