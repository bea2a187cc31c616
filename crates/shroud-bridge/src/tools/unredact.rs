//! unredact tool: restore placeholders from a session's mappings.

use serde_json::{json, Value};
use shroud_engine::RedactionEngine;

use crate::errors::BridgeResult;

/// Returns `{ original_text, entities_restored }` or `{ error }`.
pub fn handle_unredact(
    engine: &RedactionEngine,
    redacted_text: &str,
    session_id: &str,
) -> BridgeResult<Value> {
    match engine.unredact(redacted_text, session_id) {
        Ok(result) => Ok(serde_json::to_value(result).unwrap_or_else(|_| Value::Null)),
        Err(err) => Ok(json!({ "error": err.to_string() })),
    }
}
