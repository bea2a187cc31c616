//! analyze tool: detection report with partial masking, no mutation.

use serde_json::Value;
use shroud_engine::RedactionEngine;

use crate::errors::BridgeResult;
use crate::tools::parse_entity_types;

/// Returns `{ entities: [{type, start, end, score, text}] }`.
pub fn handle_analyze(
    engine: &RedactionEngine,
    text: &str,
    entity_types: Option<&[String]>,
) -> BridgeResult<Value> {
    let types = parse_entity_types(entity_types);
    let result = engine.analyze(text, types.as_deref());
    Ok(serde_json::to_value(result).unwrap_or_else(|_| Value::Null))
}
