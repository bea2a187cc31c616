//! Entity types and detection spans shared by every detection layer.
//!
//! All three layers (pattern, neural, generative) emit the same
//! [`EntitySpan`] record, so overlap resolution and validation operate on a
//! single uniform type regardless of where a candidate came from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical entity tags plus user-registered custom tags.
///
/// The wire form is always the uppercase token used inside placeholders,
/// e.g. `EMAIL_ADDRESS` in `[EMAIL_ADDRESS_1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    Person,
    Organization,
    EmailAddress,
    PhoneNumber,
    UsSsn,
    CreditCard,
    Iban,
    SwiftCode,
    PostalCode,
    IpAddress,
    Url,
    ApiKey,
    AwsAccessKey,
    ConnectionString,
    SshPrivateKey,
    UsBankRouting,
    NpiNumber,
    DeaNumber,
    InsuranceId,
    DrugName,
    MedicalCondition,
    Icd10Code,
    MedicalRecordNumber,
    Location,
    DateTime,
    Username,
    /// Runtime-registered tag. Stored uppercased with non-tag characters
    /// collapsed to underscores so it is always placeholder-safe.
    Custom(String),
}

impl EntityType {
    /// The uppercase tag used in placeholders and tool payloads.
    pub fn as_tag(&self) -> &str {
        match self {
            Self::Person => "PERSON",
            Self::Organization => "ORGANIZATION",
            Self::EmailAddress => "EMAIL_ADDRESS",
            Self::PhoneNumber => "PHONE_NUMBER",
            Self::UsSsn => "US_SSN",
            Self::CreditCard => "CREDIT_CARD",
            Self::Iban => "IBAN",
            Self::SwiftCode => "SWIFT_CODE",
            Self::PostalCode => "POSTAL_CODE",
            Self::IpAddress => "IP_ADDRESS",
            Self::Url => "URL",
            Self::ApiKey => "API_KEY",
            Self::AwsAccessKey => "AWS_ACCESS_KEY",
            Self::ConnectionString => "CONNECTION_STRING",
            Self::SshPrivateKey => "SSH_PRIVATE_KEY",
            Self::UsBankRouting => "US_BANK_ROUTING",
            Self::NpiNumber => "NPI_NUMBER",
            Self::DeaNumber => "DEA_NUMBER",
            Self::InsuranceId => "INSURANCE_ID",
            Self::DrugName => "DRUG_NAME",
            Self::MedicalCondition => "MEDICAL_CONDITION",
            Self::Icd10Code => "ICD10_CODE",
            Self::MedicalRecordNumber => "MEDICAL_RECORD_NUMBER",
            Self::Location => "LOCATION",
            Self::DateTime => "DATE_TIME",
            Self::Username => "USERNAME",
            Self::Custom(tag) => tag,
        }
    }

    /// Parse a tag string. Unknown tags become `Custom` after normalization.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "PERSON" => Self::Person,
            "ORGANIZATION" => Self::Organization,
            "EMAIL_ADDRESS" => Self::EmailAddress,
            "PHONE_NUMBER" => Self::PhoneNumber,
            "US_SSN" => Self::UsSsn,
            "CREDIT_CARD" => Self::CreditCard,
            "IBAN" => Self::Iban,
            "SWIFT_CODE" => Self::SwiftCode,
            "POSTAL_CODE" => Self::PostalCode,
            "IP_ADDRESS" => Self::IpAddress,
            "URL" => Self::Url,
            "API_KEY" => Self::ApiKey,
            "AWS_ACCESS_KEY" => Self::AwsAccessKey,
            "CONNECTION_STRING" => Self::ConnectionString,
            "SSH_PRIVATE_KEY" => Self::SshPrivateKey,
            "US_BANK_ROUTING" => Self::UsBankRouting,
            "NPI_NUMBER" => Self::NpiNumber,
            "DEA_NUMBER" => Self::DeaNumber,
            "INSURANCE_ID" => Self::InsuranceId,
            "DRUG_NAME" => Self::DrugName,
            "MEDICAL_CONDITION" => Self::MedicalCondition,
            "ICD10_CODE" => Self::Icd10Code,
            "MEDICAL_RECORD_NUMBER" => Self::MedicalRecordNumber,
            "LOCATION" => Self::Location,
            "DATE_TIME" => Self::DateTime,
            "USERNAME" => Self::Username,
            normalized => Self::Custom(sanitize_tag(normalized)),
        }
    }
}

/// Uppercase and collapse anything outside `[A-Z0-9_]` to underscores so the
/// tag is legal inside a placeholder token.
fn sanitize_tag(tag: &str) -> String {
    let mut out: String = tag
        .chars()
        .map(|c| {
            let c = c.to_ascii_uppercase();
            if c.is_ascii_uppercase() || c.is_ascii_digit() { c } else { '_' }
        })
        .collect();
    if out.is_empty() {
        out.push_str("UNKNOWN");
    }
    out
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl From<String> for EntityType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<EntityType> for String {
    fn from(entity_type: EntityType) -> Self {
        entity_type.as_tag().to_string()
    }
}

impl PartialOrd for EntityType {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityType {
    /// Alphabetical by tag. Used as the deterministic last tie-breaker when
    /// two candidates of different types cover exactly the same span.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_tag().cmp(other.as_tag())
    }
}

/// Which detection layer produced a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSource {
    Pattern,
    Neural,
    Generative,
}

/// A candidate or accepted region of input text.
///
/// `start`/`end` are byte offsets into the input, always on UTF-8 character
/// boundaries. `score` is clamped to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub entity_type: EntityType,
    pub score: f64,
    pub source: DetectionSource,
}

impl EntitySpan {
    pub fn new(
        start: usize,
        end: usize,
        entity_type: EntityType,
        score: f64,
        source: DetectionSource,
    ) -> Self {
        Self {
            start,
            end,
            entity_type,
            score: score.clamp(0.0, 1.0),
            source,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Half-open interval overlap: `a.start < b.end && b.start < a.end`.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trip_for_canonical_types() {
        for tag in ["EMAIL_ADDRESS", "US_SSN", "SWIFT_CODE", "DRUG_NAME"] {
            assert_eq!(EntityType::from_tag(tag).as_tag(), tag);
        }
    }

    #[test]
    fn unknown_tag_becomes_sanitized_custom() {
        let t = EntityType::from_tag("internal id");
        assert_eq!(t, EntityType::Custom("INTERNAL_ID".to_string()));
        assert_eq!(t.as_tag(), "INTERNAL_ID");
    }

    #[test]
    fn overlap_is_half_open() {
        let a = EntitySpan::new(0, 5, EntityType::Person, 0.9, DetectionSource::Pattern);
        let b = EntitySpan::new(5, 8, EntityType::Person, 0.9, DetectionSource::Pattern);
        let c = EntitySpan::new(4, 6, EntityType::Person, 0.9, DetectionSource::Pattern);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn entity_type_ordering_is_alphabetical() {
        assert!(EntityType::ApiKey < EntityType::EmailAddress);
        assert!(EntityType::EmailAddress < EntityType::Person);
    }
}
