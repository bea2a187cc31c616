use std::path::PathBuf;

/// Document projector errors.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("unsupported file extension: '{extension}'. Supported: {supported}")]
    UnknownFormat { extension: String, supported: String },

    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot open document {path}: {reason}")]
    CorruptedDocument { path: PathBuf, reason: String },

    #[error("LibreOffice is required for .doc file support. Install it: https://www.libreoffice.org/download/")]
    ConverterUnavailable,

    #[error("external converter failed: {reason}")]
    ConversionFailed { reason: String },

    #[error("PDF backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    /// Per-unit (paragraph/cell/page) failure. Logged by the projector and
    /// not surfaced; the unit is left unchanged.
    #[error("failed to project {unit}: {reason}")]
    ProjectorFailure { unit: String, reason: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
