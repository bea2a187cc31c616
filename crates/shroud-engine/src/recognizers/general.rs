//! General-purpose recognizers: contact details, network identifiers,
//! government and card numbers, dates.

use shroud_core::EntityType;

use super::{luhn_valid, Recognizer};

pub fn recognizers() -> Vec<Recognizer> {
    vec![
        Recognizer::new(EntityType::EmailAddress, "EmailRecognizer")
            .pattern(
                "email",
                r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b",
                0.85,
            )
            .context(&["email", "e-mail", "mail", "contact", "reach"]),
        Recognizer::new(EntityType::PhoneNumber, "PhoneRecognizer")
            .pattern(
                "us_phone",
                r"(?:\+?1[-.\s]?)?\(?\b\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b",
                0.6,
            )
            .pattern(
                "intl_phone",
                r"\+\d{1,3}[-.\s]?\d{1,4}(?:[-.\s]?\d{2,4}){2,4}\b",
                0.6,
            )
            .context(&["phone", "call", "tel", "mobile", "cell", "fax"]),
        Recognizer::new(EntityType::CreditCard, "CreditCardRecognizer")
            .pattern(
                "card_16",
                r"\b(?:\d{4}[-\s]?){3}\d{4}\b",
                0.8,
            )
            .pattern(
                "card_amex",
                r"\b\d{4}[-\s]?\d{6}[-\s]?\d{5}\b",
                0.8,
            )
            .context(&["card", "credit", "visa", "mastercard", "amex", "payment"])
            .checksum(luhn_valid),
        Recognizer::new(EntityType::UsSsn, "SsnRecognizer")
            .pattern("ssn_dashed", r"\b\d{3}-\d{2}-\d{4}\b", 0.85)
            .context(&["ssn", "social security", "social"]),
        Recognizer::new(EntityType::IpAddress, "IpRecognizer")
            .pattern(
                "ipv4",
                r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
                0.6,
            )
            .context(&["ip", "server", "host", "address", "gateway"]),
        Recognizer::new(EntityType::Url, "UrlRecognizer")
            .pattern("http_url", r#"\bhttps?://[^\s<>"']+"#, 0.6)
            .pattern(
                "www_url",
                r#"\bwww\.[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+[^\s<>"']*"#,
                0.5,
            )
            .context(&["url", "link", "website", "site"]),
        Recognizer::new(EntityType::DateTime, "DateTimeRecognizer")
            .pattern("slash_date", r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b", 0.6)
            .pattern("iso_date", r"\b\d{4}-\d{2}-\d{2}\b", 0.6)
            .pattern(
                "month_date",
                r"\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.? \d{1,2},? \d{4}\b",
                0.6,
            )
            .context(&["date", "born", "birth", "dob", "on"]),
        // Honorific-prefix heuristic: the lightweight stand-in for NER.
        // Free-standing names are the neural layer's job.
        Recognizer::new(EntityType::Person, "PersonPrefixRecognizer")
            .capture_pattern(
                "honorific_name",
                r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.?\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})",
                1,
                0.5,
            )
            .context(&["name", "patient", "contact", "attn"]),
        Recognizer::new(EntityType::Username, "UsernameRecognizer")
            .pattern("at_handle", r"\B@[A-Za-z0-9_]{3,}\b", 0.5)
            .context(&["user", "username", "handle", "login", "account"]),
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
    fn detects_email() {
        let spans = scan("Contact john.doe@example.com today");
        assert!(spans
            .iter()
            .any(|s| s.entity_type == EntityType::EmailAddress && s.start == 8 && s.end == 28));
    }

    #[test]
    fn detects_us_phone_formats() {
        for text in ["(555) 123-4567", "555-987-6543", "+1-555-111-2222"] {
            let spans = scan(text);
            assert!(
                spans.iter().any(|s| s.entity_type == EntityType::PhoneNumber),
                "phone not detected in {text}"
            );
        }
    }

    #[test]
    fn credit_card_requires_luhn() {
        let valid = scan("Card: 4532-1488-0343-6467");
        assert!(valid.iter().any(|s| s.entity_type == EntityType::CreditCard));
        let invalid = scan("Card: 1234-5678-9012-3456");
        assert!(!invalid.iter().any(|s| s.entity_type == EntityType::CreditCard));
    }

    #[test]
    fn detects_honorific_person_without_prefix_in_span() {
        let text = "Please see Dr. Jane Smith tomorrow";
        let spans = scan(text);
        let person = spans
            .iter()
            .find(|s| s.entity_type == EntityType::Person)
            .expect("person span");
        assert_eq!(&text[person.start..person.end], "Jane Smith");
    }

    #[test]
    fn plain_prose_yields_nothing_above_default_threshold() {
        let spans = scan("The sky is blue and the grass is green.");
        assert!(spans.iter().all(|s| s.score < 0.4), "unexpected spans: {spans:?}");
    }

    #[test]
    fn username_handle_not_matched_inside_email() {
        let spans = scan("write to a@b.com");
        assert!(!spans.iter().any(|s| s.entity_type == EntityType::Username));
    }
}
