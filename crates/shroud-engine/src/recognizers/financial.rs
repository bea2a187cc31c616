//! Financial recognizers: IBAN, SWIFT/BIC, bank routing, postal codes.
//!
//! Card numbers live in the general family (they carry the Luhn gate).

use shroud_core::EntityType;

use super::Recognizer;

pub fn recognizers() -> Vec<Recognizer> {
    vec![
        Recognizer::new(EntityType::Iban, "IbanRecognizer")
            .pattern(
                "iban",
                r"\b[A-Z]{2}\d{2}\s?[\dA-Z]{4}\s?(?:[\dA-Z]{4}\s?){2,7}[\dA-Z]{1,4}\b",
                0.8,
            )
            .context(&["iban", "account", "bank", "transfer"]),
        Recognizer::new(EntityType::SwiftCode, "SwiftRecognizer")
            .pattern("swift_11", r"\b[A-Z]{6}[A-Z0-9]{5}\b", 0.7)
            .pattern("swift_8", r"\b[A-Z]{6}[A-Z0-9]{2}\b", 0.5)
            .context(&["swift", "bic", "bank", "wire"]),
        Recognizer::new(EntityType::UsBankRouting, "UsBankRoutingRecognizer")
            .pattern("us_routing", r"\b\d{9}\b", 0.3)
            .context(&["routing", "aba", "bank", "transit"]),
        Recognizer::new(EntityType::PostalCode, "PostalCodeRecognizer")
            .pattern("us_zip_plus4", r"\b\d{5}-\d{4}\b", 0.3)
            .pattern("uk_postcode", r"\b[A-Z]{1,2}\d[A-Z0-9]?\s?\d[A-Z]{2}\b", 0.5)
            .pattern("generic_5_digit", r"\b\d{5}\b", 0.2)
            .context(&["zip", "postal", "postcode", "mail", "address"]),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::recognizers::RecognizerRegistry;
    use shroud_core::EntitySpan;

    fn scan(text: &str) -> Vec<EntitySpan> {
        let registry = RecognizerRegistry::with_builtins();
        registry.scan(text, None, &HashSet::new())
    }

    #[test]
    fn detects_iban_with_spaces() {
        let spans = scan("IBAN: GB29 NWBK 6016 1331 9268 19");
        assert!(spans.iter().any(|s| s.entity_type == EntityType::Iban));
    }

    #[test]
    fn detects_swift_codes_by_length() {
        let eight = scan("wire via DEUTDEFF please");
        let eleven = scan("wire via DEUTDEFF500 please");
        let s8 = eight
            .iter()
            .find(|s| s.entity_type == EntityType::SwiftCode)
            .expect("8-char swift");
        let s11 = eleven
            .iter()
            .find(|s| s.entity_type == EntityType::SwiftCode)
            .expect("11-char swift");
        assert!(s11.score > s8.score);
    }

    #[test]
    fn detects_routing_number_with_context() {
        let spans = scan("Routing number: 021000021");
        let routing = spans
            .iter()
            .find(|s| s.entity_type == EntityType::UsBankRouting)
            .expect("routing span");
        assert!(routing.score > 0.3, "context keyword should boost score");
    }

    #[test]
    fn detects_uk_postcode() {
        let spans = scan("Deliver to SW1A 1AA");
        assert!(spans.iter().any(|s| s.entity_type == EntityType::PostalCode));
    }

    #[test]
    fn bare_five_digits_score_low() {
        let spans = scan("around 90210 somewhere");
        let zip = spans
            .iter()
            .find(|s| s.entity_type == EntityType::PostalCode)
            .expect("zip span");
        assert!(zip.score < 0.4);
    }
}
