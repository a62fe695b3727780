//! Integrity primitives shared by the trailer service and the resend codec

pub mod checksum;
pub mod mac;

pub use checksum::{tag_value_checksum, trailer_checksum, verify_trailer_checksum};
pub use mac::{authentication_code, verify_authentication_code, BilateralKey};
