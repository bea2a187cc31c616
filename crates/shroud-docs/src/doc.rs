//! Legacy `.doc` support via an external LibreOffice conversion.
//!
//! The projector proper never touches the binary format: the input is
//! converted to DOCX in a scratch directory and the DOCX path takes over.
//! Output of a `.doc` input is therefore always `.docx`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use shroud_core::errors::DocumentError;
use shroud_core::{EntityType, ShroudResult};
use shroud_engine::RedactionEngine;
use tracing::debug;

use crate::docx::DocxHandler;
use crate::{DocumentHandler, RedactSummary, UnredactSummary};

pub struct DocHandler;

impl DocumentHandler for DocHandler {
    fn redact(
        &self,
        engine: &RedactionEngine,
        input: &Path,
        output: &Path,
        entity_types: Option<&[EntityType]>,
        use_placeholders: bool,
    ) -> ShroudResult<RedactSummary> {
        check_converter()?;
        let scratch = tempfile::tempdir().map_err(DocumentError::Io)?;
        let converted = convert_to_docx(input, scratch.path())?;
        DocxHandler.redact(engine, &converted, output, entity_types, use_placeholders)
    }

    fn unredact(
        &self,
        input: &Path,
        output: &Path,
        mappings: &HashMap<String, String>,
    ) -> ShroudResult<UnredactSummary> {
        // A previously redacted .doc is already .docx; delegate directly.
        DocxHandler.unredact(input, output, mappings)
    }
}

fn check_converter() -> Result<(), DocumentError> {
    let probe = Command::new("libreoffice").arg("--version").output();
    match probe {
        Ok(output) if output.status.success() => Ok(()),
        _ => Err(DocumentError::ConverterUnavailable),
    }
}

fn convert_to_docx(input: &Path, scratch: &Path) -> Result<PathBuf, DocumentError> {
    let output = Command::new("libreoffice")
        .args(["--headless", "--convert-to", "docx", "--outdir"])
        .arg(scratch)
        .arg(input)
        .output()
        .map_err(DocumentError::Io)?;
    if !output.status.success() {
        return Err(DocumentError::ConversionFailed {
            reason: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let converted = scratch.join(format!("{stem}.docx"));
    if !converted.is_file() {
        return Err(DocumentError::ConversionFailed {
            reason: format!("converter produced no output for {}", input.display()),
        });
    }
    debug!(from = %input.display(), to = %converted.display(), "converted legacy document");
    Ok(converted)
}
