use shroud_core::ShroudError;

/// Bridge-level errors: malformed tool parameters, or an engine/projector
/// failure that cannot be expressed as an error payload.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("invalid parameters: {reason}")]
    InvalidParams { reason: String },

    #[error(transparent)]
    Shroud(#[from] ShroudError),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
