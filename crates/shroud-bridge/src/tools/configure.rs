//! configure tool: runtime patterns, disabled types, score threshold.

use serde::Deserialize;
use serde_json::{json, Value};
use shroud_engine::RedactionEngine;

use crate::errors::{BridgeError, BridgeResult};

const DEFAULT_CUSTOM_SCORE: f64 = 0.8;

/// A runtime pattern definition supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomPattern {
    pub name: String,
    pub pattern: String,
    pub score: Option<f64>,
}

/// Returns `{ status, active_entities, score_threshold, llm_available }`.
/// Fails only on malformed input (bad regex, score or threshold range).
pub fn handle_configure(
    engine: &RedactionEngine,
    custom_patterns: Option<&[CustomPattern]>,
    disabled_entities: Option<&[String]>,
    score_threshold: Option<f64>,
) -> BridgeResult<Value> {
    if let Some(threshold) = score_threshold {
        engine
            .set_score_threshold(threshold)
            .map_err(|err| BridgeError::InvalidParams {
                reason: err.to_string(),
            })?;
    }

    if let Some(patterns) = custom_patterns {
        for definition in patterns {
            let score = definition.score.unwrap_or(DEFAULT_CUSTOM_SCORE);
            engine
                .add_custom_pattern(&definition.name, &definition.pattern, score)
                .map_err(|err| BridgeError::InvalidParams {
                    reason: err.to_string(),
                })?;
        }
    }

    if let Some(disabled) = disabled_entities {
        engine.set_disabled_entities(disabled);
    }

    Ok(json!({
        "status": "ok",
        "active_entities": engine.active_entities(),
        "score_threshold": engine.score_threshold(),
        "llm_available": engine.reviewer_available(),
    }))
}
