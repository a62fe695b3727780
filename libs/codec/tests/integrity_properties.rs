//! Property tests for the integrity trailer and resend codec

use codec::{BilateralKey, IntegrityFailure, ResendRequest, ResendRequestBuilder, TrailerService};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

fn service(key: &[u8]) -> TrailerService {
    TrailerService::new(BilateralKey::new(key.to_vec()).unwrap())
}

fn message(reference: &str, text: &str) -> String {
    format!(
        "{{1:F01BANKBEBBAXXX0001000123}}{{2:I103BANKDEFFXXXXN}}{{4:\r\n:20:{}\r\n:70:{}\r\n-}}",
        reference, text
    )
}

/// Printable ASCII character different from `original`
fn replacement(original: u8, pick: u8) -> char {
    let candidate = b' ' + (pick % 95);
    if candidate == original {
        if original == b'~' {
            '!'
        } else {
            (original + 1) as char
        }
    } else {
        candidate as char
    }
}

proptest! {
    #[test]
    fn appended_trailer_always_validates(
        reference in "[A-Z0-9]{1,16}",
        text in "[A-Za-z0-9 ,./-]{0,120}",
        key in proptest::collection::vec(any::<u8>(), 1..64),
    ) {
        let service = service(&key);
        let signed = service.append_trailer(&message(&reference, &text)).unwrap();
        let result = service.validate_trailer(&signed).unwrap();
        prop_assert!(result.valid);
        prop_assert_eq!(result.reason, None);

        // Re-appending is idempotent
        prop_assert_eq!(service.append_trailer(&signed).unwrap(), signed);
    }

    #[test]
    fn any_single_character_change_is_detected(
        reference in "[A-Z0-9]{1,16}",
        text in "[A-Za-z0-9 ,./-]{0,80}",
        position in any::<prop::sample::Index>(),
        pick in any::<u8>(),
    ) {
        let service = service(b"bilateral-secret");
        let signed = service.append_trailer(&message(&reference, &text)).unwrap();

        let index = position.index(signed.len());
        let original = signed.as_bytes()[index];
        let mut tampered = signed.clone();
        tampered.replace_range(index..index + 1, &replacement(original, pick).to_string());

        let result = service.validate_trailer(&tampered).unwrap();
        prop_assert!(!result.valid, "change at {} went undetected", index);
    }

    #[test]
    fn wrong_key_never_validates(
        text in "[A-Za-z0-9 ]{0,80}",
        key_a in proptest::collection::vec(any::<u8>(), 1..32),
        key_b in proptest::collection::vec(any::<u8>(), 1..32),
    ) {
        prop_assume!(key_a != key_b);
        let signed = service(&key_a).append_trailer(&message("REF", &text)).unwrap();
        let result = service(&key_b).validate_trailer(&signed).unwrap();
        prop_assert_eq!(result.reason, Some(IntegrityFailure::AuthenticationMismatch));
    }

    #[test]
    fn resend_request_parses_back(begin in 1u64..1_000_000, span in 0u64..10_000, seq in 1u64..1_000_000) {
        let request = ResendRequest::new(begin, begin + span).unwrap();
        let sending_time = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let encoded = ResendRequestBuilder::new("BANKBEBB", "SWIFTNET").build(request, seq, sending_time);
        prop_assert_eq!(ResendRequest::parse(&encoded).unwrap(), request);
    }
}
