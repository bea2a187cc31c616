//! redact tool: replace detected entities with indexed placeholders.

use serde_json::Value;
use shroud_engine::RedactionEngine;

use crate::errors::BridgeResult;
use crate::tools::parse_entity_types;

/// Returns `{ redacted_text, session_id, entities_found, entities }`.
pub fn handle_redact(
    engine: &RedactionEngine,
    text: &str,
    entity_types: Option<&[String]>,
) -> BridgeResult<Value> {
    let types = parse_entity_types(entity_types);
    let result = engine.redact(text, types.as_deref());
    Ok(serde_json::to_value(result).unwrap_or_else(|_| Value::Null))
}
