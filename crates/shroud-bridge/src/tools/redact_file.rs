//! redact_file tool: project a redaction into a document file.

use std::path::Path;

use serde_json::{json, Value};
use shroud_docs::{handler_for, redacted_output_path};
use shroud_engine::RedactionEngine;
use tracing::info;

use crate::errors::BridgeResult;
use crate::tools::parse_entity_types;

/// Returns `{ redacted_file_path, entities_found, session_id? }` or
/// `{ error }`. The session id is absent in black-box mode
/// (`use_placeholders = false`, PDF only).
pub fn handle_redact_file(
    engine: &RedactionEngine,
    file_path: &str,
    entity_types: Option<&[String]>,
    use_placeholders: bool,
) -> BridgeResult<Value> {
    let input = Path::new(file_path);
    if !input.is_file() {
        return Ok(json!({ "error": format!("File not found: {file_path}") }));
    }

    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let handler = match handler_for(&extension) {
        Ok(handler) => handler,
        Err(err) => return Ok(json!({ "error": err.to_string() })),
    };

    let types = parse_entity_types(entity_types);
    let output = redacted_output_path(input);
    match handler.redact(engine, input, &output, types.as_deref(), use_placeholders) {
        Ok(summary) => {
            info!(
                input = %input.display(),
                output = %output.display(),
                entities = summary.entities_found,
                "file redacted"
            );
            let mut payload = json!({
                "redacted_file_path": output.to_string_lossy(),
                "entities_found": summary.entities_found,
            });
            if let Some(session_id) = summary.session_id {
                payload["session_id"] = Value::String(session_id);
            }
            Ok(payload)
        }
        Err(err) => Ok(json!({ "error": format!("Redaction failed: {err}") })),
    }
}
