//! unredact_file tool: reverse a file redaction from a session.

use std::path::Path;

use serde_json::{json, Value};
use shroud_docs::{handler_for, unredacted_output_path};
use shroud_engine::RedactionEngine;

use crate::errors::BridgeResult;

/// Returns `{ unredacted_file_path, entities_restored }` or `{ error }`.
pub fn handle_unredact_file(
    engine: &RedactionEngine,
    file_path: &str,
    session_id: &str,
) -> BridgeResult<Value> {
    let input = Path::new(file_path);
    if !input.is_file() {
        return Ok(json!({ "error": format!("File not found: {file_path}") }));
    }

    let Some(mappings) = engine.sessions().get(session_id) else {
        return Ok(json!({ "error": format!("Session '{session_id}' not found or expired") }));
    };

    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let handler = match handler_for(&extension) {
        Ok(handler) => handler,
        Err(err) => return Ok(json!({ "error": err.to_string() })),
    };

    let output = unredacted_output_path(input);
    match handler.unredact(input, &output, &mappings) {
        Ok(summary) => Ok(json!({
            "unredacted_file_path": output.to_string_lossy(),
            "entities_restored": summary.entities_restored,
        })),
        Err(err) => Ok(json!({ "error": format!("Unredaction failed: {err}") })),
    }
}
