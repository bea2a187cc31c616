//! Error types for the shroud workspace, one enum per domain plus an
//! aggregate used at crate boundaries.

mod document_error;
mod engine_error;

pub use document_error::DocumentError;
pub use engine_error::EngineError;

/// Aggregate error for cross-crate call paths.
#[derive(Debug, thiserror::Error)]
pub enum ShroudError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

pub type ShroudResult<T> = Result<T, ShroudError>;
