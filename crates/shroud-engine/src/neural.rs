//! Label wiring for the zero-shot tagger (detection layer 2).
//!
//! The engine owns a fixed mapping from tagger labels to canonical entity
//! types. Labels are restricted to semantic types that benefit from
//! context; structured-format types (card numbers, SSNs, IBANs, postal
//! codes) are deliberately absent because the pattern layer is both more
//! precise and more deterministic for them.

use shroud_core::EntityType;

const LABEL_MAP: &[(&str, EntityType)] = &[
    ("person", EntityType::Person),
    ("organization", EntityType::Organization),
    ("phone number", EntityType::PhoneNumber),
    ("mobile phone number", EntityType::PhoneNumber),
    ("address", EntityType::Location),
    ("email", EntityType::EmailAddress),
    ("date of birth", EntityType::DateTime),
    ("medication", EntityType::DrugName),
    ("medical condition", EntityType::MedicalCondition),
    ("username", EntityType::Username),
];

/// The ordered label list handed to the tagger.
pub fn tagger_labels() -> Vec<&'static str> {
    LABEL_MAP.iter().map(|(label, _)| *label).collect()
}

/// Map a tagger label back to its canonical entity type.
pub fn entity_for_label(label: &str) -> Option<EntityType> {
    let needle = label.trim().to_lowercase();
    LABEL_MAP
        .iter()
        .find(|(label, _)| *label == needle)
        .map(|(_, entity_type)| entity_type.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_to_entity_types() {
        for label in tagger_labels() {
            assert!(entity_for_label(label).is_some(), "unmapped label {label}");
        }
    }

    #[test]
    fn address_maps_to_location() {
        assert_eq!(entity_for_label("address"), Some(EntityType::Location));
    }

    #[test]
    fn structured_labels_are_excluded() {
        assert_eq!(entity_for_label("credit card"), None);
        assert_eq!(entity_for_label("ssn"), None);
    }

    #[test]
    fn mapping_is_case_insensitive() {
        assert_eq!(entity_for_label("Person"), Some(EntityType::Person));
    }
}
