//! Plain-text projection: `.txt`, `.csv`, `.log`, `.md`.
//!
//! The trivial case: one engine call over the whole file, and placeholder
//! string replacement on the way back.

use std::collections::HashMap;
use std::path::Path;

use shroud_core::errors::DocumentError;
use shroud_core::{EntityType, ShroudResult};
use shroud_engine::RedactionEngine;

use crate::{apply_mappings, write_atomic, DocumentHandler, RedactSummary, UnredactSummary};

pub struct PlainTextHandler;

impl DocumentHandler for PlainTextHandler {
    fn redact(
        &self,
        engine: &RedactionEngine,
        input: &Path,
        output: &Path,
        entity_types: Option<&[EntityType]>,
        _use_placeholders: bool,
    ) -> ShroudResult<RedactSummary> {
        let content = std::fs::read_to_string(input).map_err(DocumentError::Io)?;
        let result = engine.redact(&content, entity_types);
        write_atomic(output, result.redacted_text.as_bytes())?;
        Ok(RedactSummary {
            session_id: Some(result.session_id),
            entities_found: result.entities_found,
        })
    }

    fn unredact(
        &self,
        input: &Path,
        output: &Path,
        mappings: &HashMap<String, String>,
    ) -> ShroudResult<UnredactSummary> {
        let content = std::fs::read_to_string(input).map_err(DocumentError::Io)?;
        let (restored, entities_restored) = apply_mappings(&content, mappings);
        write_atomic(output, restored.as_bytes())?;
        Ok(UnredactSummary { entities_restored })
    }
}
