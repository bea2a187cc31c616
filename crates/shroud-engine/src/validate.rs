//! Per-type syntactic validation of accepted spans.
//!
//! Pattern scores alone admit plausible-looking noise (an uppercase word
//! ranked as a SWIFT code, a bare hostname as an IP). Types with a rigid
//! wire format get a full-match check on the covered substring; spans that
//! fail are dropped. Types without a rigid format pass through on score
//! alone.

use std::sync::LazyLock;

use regex::Regex;
use shroud_core::{EntitySpan, EntityType};
use tracing::debug;

static SWIFT_EXACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{6}[A-Z0-9]{2,5}$").expect("static regex"));
static IBAN_EXACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}\d{2}[A-Z0-9]{4,}$").expect("static regex"));
static SSN_EXACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-?\d{2}-?\d{4}$").expect("static regex"));
static IP_EXACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(\.\d{1,3}){3}$").expect("static regex"));

/// Whether `original` is syntactically plausible for its claimed type.
pub fn is_valid(entity_type: &EntityType, original: &str) -> bool {
    match entity_type {
        EntityType::SwiftCode => SWIFT_EXACT.is_match(original),
        EntityType::Iban => {
            let compact: String = original.split_whitespace().collect();
            IBAN_EXACT.is_match(&compact)
        }
        EntityType::CreditCard => {
            let digits = original.chars().filter(char::is_ascii_digit).count();
            (13..=19).contains(&digits)
        }
        EntityType::UsSsn => SSN_EXACT.is_match(original),
        EntityType::EmailAddress => {
            let Some((_, domain)) = original.split_once('@') else {
                return false;
            };
            domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        EntityType::IpAddress => IP_EXACT.is_match(original),
        EntityType::PhoneNumber => {
            original.chars().filter(char::is_ascii_digit).count() >= 7
        }
        _ => true,
    }
}

/// Drop spans whose covered substring fails the type check.
pub fn retain_valid(spans: Vec<EntitySpan>, text: &str) -> Vec<EntitySpan> {
    spans
        .into_iter()
        .filter(|span| {
            let original = &text[span.start..span.end];
            let ok = is_valid(&span.entity_type, original);
            if !ok {
                debug!(
                    entity_type = %span.entity_type,
                    start = span.start,
                    end = span.end,
                    "dropping span that failed format validation"
                );
            }
            ok
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swift_rejects_plain_words() {
        assert!(!is_valid(&EntityType::SwiftCode, "document"));
        assert!(!is_valid(&EntityType::SwiftCode, "DATABASE"));
        assert!(is_valid(&EntityType::SwiftCode, "DEUTDEFF"));
        assert!(is_valid(&EntityType::SwiftCode, "DEUTDEFF500"));
    }

    #[test]
    fn iban_strips_spaces_before_matching() {
        assert!(is_valid(&EntityType::Iban, "GB29 NWBK 6016 1331 9268 19"));
        assert!(is_valid(&EntityType::Iban, "DE89370400440532013000"));
        assert!(!is_valid(&EntityType::Iban, "not an iban"));
    }

    #[test]
    fn credit_card_needs_13_to_19_digits() {
        assert!(is_valid(&EntityType::CreditCard, "4111-1111-1111-1111"));
        assert!(!is_valid(&EntityType::CreditCard, "4111-1111"));
        assert!(!is_valid(&EntityType::CreditCard, "1".repeat(20).as_str()));
    }

    #[test]
    fn ssn_accepts_dashed_and_plain() {
        assert!(is_valid(&EntityType::UsSsn, "123-45-6789"));
        assert!(is_valid(&EntityType::UsSsn, "123456789"));
        assert!(!is_valid(&EntityType::UsSsn, "12-345-6789"));
    }

    #[test]
    fn email_needs_at_and_dotted_domain() {
        assert!(is_valid(&EntityType::EmailAddress, "john@example.com"));
        assert!(!is_valid(&EntityType::EmailAddress, "notanemail"));
        assert!(!is_valid(&EntityType::EmailAddress, "john@localhost"));
        assert!(!is_valid(&EntityType::EmailAddress, "john@example."));
    }

    #[test]
    fn ip_rejects_hostnames() {
        assert!(is_valid(&EntityType::IpAddress, "192.168.1.1"));
        assert!(!is_valid(&EntityType::IpAddress, "localhost"));
        assert!(!is_valid(&EntityType::IpAddress, "192.168.1"));
    }

    #[test]
    fn phone_needs_seven_digits() {
        assert!(is_valid(&EntityType::PhoneNumber, "(555) 123-4567"));
        assert!(!is_valid(&EntityType::PhoneNumber, "555-123"));
    }

    #[test]
    fn unchecked_types_pass_through() {
        assert!(is_valid(&EntityType::Person, "anything at all"));
        assert!(is_valid(&EntityType::DrugName, "Metformin"));
    }
}
