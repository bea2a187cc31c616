/// Detection-engine errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("session '{session_id}' not found or expired")]
    SessionMissing { session_id: String },

    #[error("score_threshold must be between 0.0 and 1.0, got {value}")]
    InvalidThreshold { value: f64 },

    #[error("custom pattern '{name}' is invalid: {reason}")]
    InvalidPattern { name: String, reason: String },

    /// L2/L3 failures. Never surfaced to callers: detection proceeds
    /// without the failing layer and the error is logged instead.
    #[error("detection layer '{layer}' failed: {reason}")]
    LayerFailure { layer: &'static str, reason: String },
}
