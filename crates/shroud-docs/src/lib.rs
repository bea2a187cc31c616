//! # shroud-docs
//!
//! Document projector: applies detection-engine output to structured
//! document files without collapsing their formatting, and reverses the
//! substitution from a session's mappings.
//!
//! The projector never re-runs detection on reassembled text. Each format
//! handler extracts text per structural unit (paragraph, cell, page), calls
//! the engine once per unit, and projects the resulting placeholders back
//! into that unit using the engine's entity offsets.
//!
//! Failure semantics: an error on a single unit is logged and the unit left
//! unchanged; an error opening the document fails the whole call.

mod doc;
mod docx;
mod ooxml;
mod pdf;
mod plain_text;
mod xlsx;

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use shroud_core::errors::DocumentError;
use shroud_core::{EntityType, ShroudResult};
use shroud_engine::RedactionEngine;

pub use doc::DocHandler;
pub use docx::DocxHandler;
pub use pdf::PdfHandler;
pub use plain_text::PlainTextHandler;
pub use xlsx::XlsxHandler;

/// Extensions the projector accepts, in dispatch order.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["txt", "csv", "log", "md", "docx", "xlsx", "pdf", "doc"];

/// Result of redacting one file.
#[derive(Debug, Clone)]
pub struct RedactSummary {
    /// Absent in black-box mode (irreversible redaction).
    pub session_id: Option<String>,
    pub entities_found: usize,
}

/// Result of reversing one file.
#[derive(Debug, Clone)]
pub struct UnredactSummary {
    pub entities_restored: usize,
}

/// Per-format projection of engine output into a document file.
pub trait DocumentHandler: Send + Sync {
    fn redact(
        &self,
        engine: &RedactionEngine,
        input: &Path,
        output: &Path,
        entity_types: Option<&[EntityType]>,
        use_placeholders: bool,
    ) -> ShroudResult<RedactSummary>;

    fn unredact(
        &self,
        input: &Path,
        output: &Path,
        mappings: &HashMap<String, String>,
    ) -> ShroudResult<UnredactSummary>;
}

/// Handler for a lowercased file extension (without the dot).
pub fn handler_for(extension: &str) -> Result<Box<dyn DocumentHandler>, DocumentError> {
    match extension.to_ascii_lowercase().as_str() {
        "txt" | "csv" | "log" | "md" => Ok(Box::new(PlainTextHandler)),
        "docx" => Ok(Box::new(DocxHandler)),
        "xlsx" => Ok(Box::new(XlsxHandler)),
        "pdf" => Ok(Box::new(PdfHandler)),
        "doc" => Ok(Box::new(DocHandler)),
        other => Err(DocumentError::UnknownFormat {
            extension: other.to_string(),
            supported: SUPPORTED_EXTENSIONS.join(", "),
        }),
    }
}

/// `<base>_redacted<ext>` next to the input. Legacy `.doc` inputs always
/// produce `.docx` output.
pub fn redacted_output_path(input: &Path) -> PathBuf {
    suffixed_output_path(input, "_redacted")
}

/// `<base>_unredacted<ext>` next to the input.
pub fn unredacted_output_path(input: &Path) -> PathBuf {
    suffixed_output_path(input, "_unredacted")
}

fn suffixed_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let extension = if extension == "doc" { "docx".to_string() } else { extension };
    let file_name = if extension.is_empty() {
        format!("{stem}{suffix}")
    } else {
        format!("{stem}{suffix}.{extension}")
    };
    input.with_file_name(file_name)
}

/// Copy every mapping of `source` into `target`. Used by handlers that run
/// the engine once per structural unit but must hand back one session id.
pub(crate) fn merge_into_session(engine: &RedactionEngine, target: &str, source: &str) {
    if let Some(mappings) = engine.sessions().get(source) {
        for (placeholder, original) in mappings {
            engine.sessions().add(target, &placeholder, &original);
        }
    }
}

/// Write `bytes` to `path` atomically: temp file in the same directory,
/// then rename over the destination.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DocumentError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new()?,
    };
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|err| DocumentError::Io(err.error))?;
    Ok(())
}

/// Replace every mapped placeholder in `text`, counting distinct
/// placeholders that occurred at least once.
pub(crate) fn apply_mappings(text: &str, mappings: &HashMap<String, String>) -> (String, usize) {
    let mut restored = text.to_string();
    let mut count = 0;
    for (placeholder, original) in mappings {
        if restored.contains(placeholder.as_str()) {
            restored = restored.replace(placeholder.as_str(), original);
            count += 1;
        }
    }
    (restored, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_naming_keeps_extension() {
        let out = redacted_output_path(Path::new("/tmp/report.xlsx"));
        assert_eq!(out, Path::new("/tmp/report_redacted.xlsx"));
        let back = unredacted_output_path(Path::new("/tmp/report_redacted.xlsx"));
        assert_eq!(back, Path::new("/tmp/report_redacted_unredacted.xlsx"));
    }

    #[test]
    fn doc_input_becomes_docx_output() {
        let out = redacted_output_path(Path::new("/tmp/legacy.doc"));
        assert_eq!(out, Path::new("/tmp/legacy_redacted.docx"));
    }

    #[test]
    fn unknown_extension_is_an_error() {
        assert!(handler_for("pptx").is_err());
        assert!(handler_for("txt").is_ok());
        assert!(handler_for("DOCX").is_ok());
    }
}
