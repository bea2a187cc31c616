use shroud_bridge::tools::configure::CustomPattern;
use shroud_bridge::{
    handle_analyze, handle_configure, handle_redact, handle_redact_file, handle_unredact,
    handle_unredact_file,
};
use shroud_core::EngineConfig;
use shroud_engine::RedactionEngine;

fn engine() -> RedactionEngine {
    RedactionEngine::new(EngineConfig {
        use_reviewer: false,
        ..EngineConfig::default()
    })
}

#[test]
fn redact_payload_shape() {
    let e = engine();
    let payload = handle_redact(&e, "Contact john@example.com for info", None).unwrap();
    assert_eq!(
        payload["redacted_text"],
        "Contact [EMAIL_ADDRESS_1] for info"
    );
    assert_eq!(payload["entities_found"], 1);
    assert!(payload["session_id"].is_string());
    let entity = &payload["entities"][0];
    assert_eq!(entity["type"], "EMAIL_ADDRESS");
    assert_eq!(entity["placeholder"], "[EMAIL_ADDRESS_1]");
    assert_eq!(entity["original_start"], 8);
    assert_eq!(entity["original_end"], 24);
}

#[test]
fn redact_then_unredact_through_tools() {
    let e = engine();
    let redacted = handle_redact(&e, "mail a@b.com and c@d.com", None).unwrap();
    let restored = handle_unredact(
        &e,
        redacted["redacted_text"].as_str().unwrap(),
        redacted["session_id"].as_str().unwrap(),
    )
    .unwrap();
    assert_eq!(restored["original_text"], "mail a@b.com and c@d.com");
    assert_eq!(restored["entities_restored"], 2);
}

#[test]
fn unredact_unknown_session_is_error_payload() {
    let payload = handle_unredact(&engine(), "text", "missing-session").unwrap();
    assert!(payload["error"].as_str().unwrap().contains("missing-session"));
}

#[test]
fn analyze_masks_values() {
    let payload = handle_analyze(&engine(), "Contact john@example.com", None).unwrap();
    let entity = &payload["entities"][0];
    assert_eq!(entity["type"], "EMAIL_ADDRESS");
    assert_ne!(entity["text"], "john@example.com");
    assert!(entity["score"].is_number());
}

#[test]
fn configure_reports_state() {
    let e = engine();
    let payload = handle_configure(
        &e,
        Some(&[CustomPattern {
            name: "INTERNAL_ID".to_string(),
            pattern: r"ID-\d{6}".to_string(),
            score: Some(0.9),
        }]),
        Some(&["CREDIT_CARD".to_string()]),
        Some(0.5),
    )
    .unwrap();
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["score_threshold"], 0.5);
    let active: Vec<&str> = payload["active_entities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(active.contains(&"INTERNAL_ID"));
    assert!(!active.contains(&"CREDIT_CARD"));
    let mut sorted = active.clone();
    sorted.sort();
    assert_eq!(active, sorted, "active_entities must be sorted");
    assert!(payload["llm_available"].is_boolean());
}

#[test]
fn configure_rejects_malformed_input() {
    let e = engine();
    assert!(handle_configure(&e, None, None, Some(2.0)).is_err());
    assert!(handle_configure(
        &e,
        Some(&[CustomPattern {
            name: "BAD".to_string(),
            pattern: "([".to_string(),
            score: None,
        }]),
        None,
        None,
    )
    .is_err());
}

#[test]
fn redact_file_round_trip_plain_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("report.txt");
    std::fs::write(&input, "Send results to jane@corp.org today").unwrap();

    let e = engine();
    let redacted = handle_redact_file(&e, input.to_str().unwrap(), None, true).unwrap();
    let redacted_path = redacted["redacted_file_path"].as_str().unwrap();
    assert!(redacted_path.ends_with("report_redacted.txt"));
    assert_eq!(redacted["entities_found"], 1);
    let content = std::fs::read_to_string(redacted_path).unwrap();
    assert!(!content.contains("jane@corp.org"));

    let restored = handle_unredact_file(
        &e,
        redacted_path,
        redacted["session_id"].as_str().unwrap(),
    )
    .unwrap();
    let restored_path = restored["unredacted_file_path"].as_str().unwrap();
    assert!(restored_path.ends_with("report_redacted_unredacted.txt"));
    assert_eq!(
        std::fs::read_to_string(restored_path).unwrap(),
        "Send results to jane@corp.org today"
    );
}

#[test]
fn redact_file_missing_file_is_error_payload() {
    let payload = handle_redact_file(&engine(), "/no/such/file.txt", None, true).unwrap();
    assert!(payload["error"].as_str().unwrap().contains("File not found"));
}

#[test]
fn redact_file_unknown_extension_is_error_payload() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("slides.pptx");
    std::fs::write(&input, "not really a pptx").unwrap();
    let payload = handle_redact_file(&engine(), input.to_str().unwrap(), None, true).unwrap();
    assert!(payload["error"]
        .as_str()
        .unwrap()
        .contains("unsupported file extension"));
}

#[test]
fn unredact_file_expired_session_is_error_payload() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("note.txt");
    std::fs::write(&input, "[EMAIL_ADDRESS_1]").unwrap();
    let payload =
        handle_unredact_file(&engine(), input.to_str().unwrap(), "gone-session").unwrap();
    assert!(payload["error"]
        .as_str()
        .unwrap()
        .contains("not found or expired"));
}
