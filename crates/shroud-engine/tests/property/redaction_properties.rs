use proptest::prelude::*;
use shroud_core::EngineConfig;
use shroud_engine::RedactionEngine;

fn engine() -> RedactionEngine {
    RedactionEngine::new(EngineConfig {
        use_reviewer: false,
        ..EngineConfig::default()
    })
}

proptest! {
    // Redact-then-unredact restores the input byte for byte.
    #[test]
    fn round_trip_restores_input(
        prefix in "[a-zA-Z ]{0,40}",
        user in "[a-z]{2,10}",
        domain in "[a-z]{2,10}",
        suffix in "[a-zA-Z ]{0,40}",
    ) {
        let text = format!("{prefix}{user}@{domain}.com{suffix}");
        let e = engine();
        let redacted = e.redact(&text, None);
        let restored = e.unredact(&redacted.redacted_text, &redacted.session_id).unwrap();
        prop_assert_eq!(restored.original_text, text);
    }

    // Round trip holds for arbitrary text as well, entities or not.
    #[test]
    fn round_trip_arbitrary_text(text in ".{0,200}") {
        let e = engine();
        let redacted = e.redact(&text, None);
        let restored = e.unredact(&redacted.redacted_text, &redacted.session_id).unwrap();
        prop_assert_eq!(restored.original_text, text);
    }

    // No accepted original substring survives in the redacted text.
    #[test]
    fn accepted_originals_do_not_survive(
        user in "[a-z]{3,10}",
        domain in "[a-z]{3,10}",
    ) {
        let email = format!("{user}@{domain}.org");
        let text = format!("contact {email} today");
        let result = engine().redact(&text, None);
        prop_assert!(!result.redacted_text.contains(&email));
    }

    // The session mapping always mirrors the entity list exactly.
    #[test]
    fn mapping_size_equals_entities_found(text in ".{0,200}") {
        let e = engine();
        let result = e.redact(&text, None);
        let mappings = e.sessions().get(&result.session_id).unwrap();
        prop_assert_eq!(mappings.len(), result.entities_found);
        prop_assert_eq!(result.entities.len(), result.entities_found);
    }

    // A threshold of 1.0 accepts nothing, whatever the input.
    #[test]
    fn threshold_one_accepts_nothing(text in ".{0,200}") {
        let e = engine();
        e.set_score_threshold(1.0).unwrap();
        let result = e.redact(&text, None);
        prop_assert_eq!(result.entities_found, 0);
        prop_assert_eq!(result.redacted_text, text);
    }

    // Accepted spans never overlap.
    #[test]
    fn accepted_spans_never_overlap(text in ".{0,300}") {
        let result = engine().redact(&text, None);
        let mut spans: Vec<(usize, usize)> = result
            .entities
            .iter()
            .map(|entity| (entity.original_start, entity.original_end))
            .collect();
        spans.sort();
        for pair in spans.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].0);
        }
    }
}
