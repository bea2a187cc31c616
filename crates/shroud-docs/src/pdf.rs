//! PDF projection via Pdfium, binding to the system library.
//!
//! Per page: the page's characters are collected into a text buffer with
//! per-char geometry and typography, the engine runs over that buffer, and
//! each accepted span is projected back as one redaction rectangle per text
//! line. Applying a redaction removes every text object intersecting the
//! rectangle (Pdfium edits at object granularity) and, in placeholder mode,
//! inserts the placeholder using the span's font family and size — serif
//! maps to Times, monospace to Courier, anything else to Helvetica.
//!
//! Placeholder mode is reversible because the placeholder remains
//! searchable text in the saved file; flattening the PDF downstream breaks
//! that. Black-box mode draws an opaque rectangle instead, returns no
//! session id, and cannot be reversed.
//!
//! Per-page failures are logged and the page left unchanged; earlier pages
//! keep their redactions. The final save is atomic.

use std::collections::HashMap;
use std::path::Path;

use pdfium_render::prelude::*;
use shroud_core::errors::DocumentError;
use shroud_core::{EntityType, ShroudResult};
use shroud_engine::RedactionEngine;
use tracing::warn;

use crate::{merge_into_session, DocumentHandler, RedactSummary, UnredactSummary};

/// Vertical tolerance when grouping span characters into lines (points).
const LINE_TOLERANCE: f32 = 2.0;
/// Padding applied around redaction rectangles (points).
const RECT_PADDING: f32 = 0.5;

pub struct PdfHandler;

impl DocumentHandler for PdfHandler {
    fn redact(
        &self,
        engine: &RedactionEngine,
        input: &Path,
        output: &Path,
        entity_types: Option<&[EntityType]>,
        use_placeholders: bool,
    ) -> ShroudResult<RedactSummary> {
        let pdfium = bind_pdfium()?;
        let mut document =
            pdfium
                .load_pdf_from_file(input, None)
                .map_err(|err| DocumentError::CorruptedDocument {
                    path: input.to_path_buf(),
                    reason: err.to_string(),
                })?;

        let fonts = BuiltinFonts::load(&mut document);
        let session_id = engine.sessions().create();
        let mut entities_found = 0;

        let page_count = document.pages().len();
        for page_index in 0..page_count {
            match redact_page(
                engine,
                &document,
                &fonts,
                page_index,
                entity_types,
                &session_id,
                use_placeholders,
            ) {
                Ok(found) => entities_found += found,
                Err(reason) => {
                    warn!(page = page_index, %reason, "leaving page unredacted");
                }
            }
        }

        save_atomic(&document, output)?;
        Ok(RedactSummary {
            session_id: use_placeholders.then_some(session_id),
            entities_found,
        })
    }

    fn unredact(
        &self,
        input: &Path,
        output: &Path,
        mappings: &HashMap<String, String>,
    ) -> ShroudResult<UnredactSummary> {
        let pdfium = bind_pdfium()?;
        let mut document =
            pdfium
                .load_pdf_from_file(input, None)
                .map_err(|err| DocumentError::CorruptedDocument {
                    path: input.to_path_buf(),
                    reason: err.to_string(),
                })?;

        let fonts = BuiltinFonts::load(&mut document);
        let mut entities_restored = 0;

        let page_count = document.pages().len();
        for page_index in 0..page_count {
            match restore_page(&document, &fonts, page_index, mappings) {
                Ok(restored) => entities_restored += restored,
                Err(reason) => {
                    warn!(page = page_index, %reason, "leaving page unrestored");
                }
            }
        }

        save_atomic(&document, output)?;
        Ok(UnredactSummary { entities_restored })
    }
}

fn bind_pdfium() -> Result<Pdfium, DocumentError> {
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|err| DocumentError::BackendUnavailable {
            reason: err.to_string(),
        })
}

fn save_atomic(document: &PdfDocument<'_>, output: &Path) -> Result<(), DocumentError> {
    let dir = output.parent().filter(|p| !p.as_os_str().is_empty());
    let tmp = match dir {
        Some(dir) => tempfile::Builder::new().suffix(".pdf").tempfile_in(dir)?,
        None => tempfile::Builder::new().suffix(".pdf").tempfile()?,
    };
    let tmp_path = tmp.into_temp_path();
    document
        .save_to_file(&tmp_path)
        .map_err(|err| DocumentError::ProjectorFailure {
            unit: "pdf save".to_string(),
            reason: err.to_string(),
        })?;
    tmp_path
        .persist(output)
        .map_err(|err| DocumentError::Io(err.error))?;
    Ok(())
}

/// Pre-resolved base-14 font handles for placeholder insertion.
struct BuiltinFonts {
    serif: PdfFontToken,
    mono: PdfFontToken,
    sans: PdfFontToken,
}

impl BuiltinFonts {
    fn load(document: &mut PdfDocument<'_>) -> Self {
        Self {
            serif: document.fonts_mut().times_roman(),
            mono: document.fonts_mut().courier(),
            sans: document.fonts_mut().helvetica(),
        }
    }

    /// Map an embedded font's name to the closest base-14 family.
    fn for_font_name(&self, name: &str) -> PdfFontToken {
        let lowered = name.to_lowercase();
        if lowered.contains("courier") || lowered.contains("mono") {
            self.mono
        } else if lowered.contains("times")
            || lowered.contains("serif")
            || lowered.contains("georgia")
            || lowered.contains("garamond")
            || lowered.contains("roman")
        {
            self.serif
        } else {
            self.sans
        }
    }
}

/// One extracted character with geometry and typography.
struct PageChar {
    byte_offset: usize,
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    font_size: f32,
    font_name: String,
}

/// Extract the page text and a parallel per-char table. The returned
/// string's byte offsets index into the table.
fn page_chars(page: &PdfPage<'_>) -> Result<(String, Vec<PageChar>), String> {
    let text = page.text().map_err(|err| err.to_string())?;
    let mut buffer = String::new();
    let mut chars = Vec::new();
    for character in text.chars().iter() {
        let ch = character.unicode_char().unwrap_or(' ');
        let bounds = match character.loose_bounds() {
            Ok(bounds) => bounds,
            Err(_) => {
                buffer.push(ch);
                continue;
            }
        };
        chars.push(PageChar {
            byte_offset: buffer.len(),
            left: bounds.left().value,
            right: bounds.right().value,
            bottom: bounds.bottom().value,
            top: bounds.top().value,
            font_size: character.scaled_font_size().value,
            font_name: character.font_name(),
        });
        buffer.push(ch);
    }
    Ok((buffer, chars))
}

/// Axis-aligned redaction rectangle plus the typography of its first char.
struct SpanRect {
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    font_size: f32,
    font_name: String,
}

/// Group the characters covering `[start, end)` into one rectangle per
/// text line.
fn span_rects(chars: &[PageChar], start: usize, end: usize) -> Vec<SpanRect> {
    let mut rects: Vec<SpanRect> = Vec::new();
    for character in chars
        .iter()
        .filter(|c| c.byte_offset >= start && c.byte_offset < end)
    {
        match rects
            .last_mut()
            .filter(|rect| (rect.bottom - character.bottom).abs() <= LINE_TOLERANCE)
        {
            Some(rect) => {
                rect.left = rect.left.min(character.left);
                rect.right = rect.right.max(character.right);
                rect.bottom = rect.bottom.min(character.bottom);
                rect.top = rect.top.max(character.top);
            }
            None => rects.push(SpanRect {
                left: character.left,
                right: character.right,
                bottom: character.bottom,
                top: character.top,
                font_size: character.font_size,
                font_name: character.font_name.clone(),
            }),
        }
    }
    rects
}

fn rect_hits(rect: &SpanRect, left: f32, bottom: f32, right: f32, top: f32) -> bool {
    rect.left - RECT_PADDING < right
        && left < rect.right + RECT_PADDING
        && rect.bottom - RECT_PADDING < top
        && bottom < rect.top + RECT_PADDING
}

/// Remove every text object on the page that intersects one of `rects`.
fn remove_covered_text(page: &mut PdfPage<'_>, rects: &[SpanRect]) -> usize {
    let mut removed = 0;
    loop {
        let mut doomed = None;
        for index in 0..page.objects().len() {
            let Ok(object) = page.objects().get(index) else {
                continue;
            };
            if object.object_type() != PdfPageObjectType::Text {
                continue;
            }
            let Ok(bounds) = object.bounds() else {
                continue;
            };
            let (left, bottom) = (bounds.left().value, bounds.bottom().value);
            let (right, top) = (bounds.right().value, bounds.top().value);
            if rects.iter().any(|r| rect_hits(r, left, bottom, right, top)) {
                doomed = Some(object);
                break;
            }
        }
        match doomed {
            Some(object) => {
                if page.objects_mut().remove_object(object).is_err() {
                    break;
                }
                removed += 1;
            }
            None => break,
        }
    }
    removed
}

fn insert_text<'a>(
    document: &PdfDocument<'a>,
    page: &mut PdfPage<'a>,
    fonts: &BuiltinFonts,
    rect: &SpanRect,
    text: &str,
) -> Result<(), String> {
    let font = fonts.for_font_name(&rect.font_name);
    let size = if rect.font_size > 0.0 { rect.font_size } else { 10.0 };
    let mut object = PdfPageTextObject::new(document, text, font, PdfPoints::new(size))
        .map_err(|err| err.to_string())?;
    object
        .translate(PdfPoints::new(rect.left), PdfPoints::new(rect.bottom))
        .map_err(|err| err.to_string())?;
    page.objects_mut()
        .add_text_object(object)
        .map_err(|err| err.to_string())?;
    Ok(())
}

fn insert_black_box<'a>(
    document: &PdfDocument<'a>,
    page: &mut PdfPage<'a>,
    rect: &SpanRect,
) -> Result<(), String> {
    let pdf_rect = PdfRect::new(
        PdfPoints::new(rect.bottom - RECT_PADDING),
        PdfPoints::new(rect.left - RECT_PADDING),
        PdfPoints::new(rect.top + RECT_PADDING),
        PdfPoints::new(rect.right + RECT_PADDING),
    );
    let object = PdfPagePathObject::new_rect(
        document,
        pdf_rect,
        None,
        None,
        Some(PdfColor::new(0, 0, 0, 255)),
    )
    .map_err(|err| err.to_string())?;
    page.objects_mut()
        .add_path_object(object)
        .map_err(|err| err.to_string())?;
    Ok(())
}

fn redact_page(
    engine: &RedactionEngine,
    document: &PdfDocument<'_>,
    fonts: &BuiltinFonts,
    page_index: u16,
    entity_types: Option<&[EntityType]>,
    session_id: &str,
    use_placeholders: bool,
) -> Result<usize, String> {
    let mut page = document
        .pages()
        .get(page_index)
        .map_err(|err| err.to_string())?;
    let (page_text, chars) = page_chars(&page)?;
    if page_text.trim().is_empty() {
        return Ok(0);
    }

    let result = engine.redact(&page_text, entity_types);
    if result.entities_found == 0 {
        return Ok(0);
    }
    if use_placeholders {
        merge_into_session(engine, session_id, &result.session_id);
    }

    for entity in &result.entities {
        let rects = span_rects(&chars, entity.original_start, entity.original_end);
        if rects.is_empty() {
            warn!(
                placeholder = %entity.placeholder,
                "no geometry for span; skipping"
            );
            continue;
        }
        remove_covered_text(&mut page, &rects);
        if use_placeholders {
            if let Some(first) = rects.first() {
                insert_text(document, &mut page, fonts, first, &entity.placeholder)?;
            }
        } else {
            for rect in &rects {
                insert_black_box(document, &mut page, rect)?;
            }
        }
    }

    Ok(result.entities_found)
}

fn restore_page(
    document: &PdfDocument<'_>,
    fonts: &BuiltinFonts,
    page_index: u16,
    mappings: &HashMap<String, String>,
) -> Result<usize, String> {
    let mut page = document
        .pages()
        .get(page_index)
        .map_err(|err| err.to_string())?;
    let (page_text, chars) = page_chars(&page)?;
    if page_text.is_empty() {
        return Ok(0);
    }

    let mut restored = 0;
    for (placeholder, original) in mappings {
        let occurrences: Vec<usize> = page_text
            .match_indices(placeholder.as_str())
            .map(|(offset, _)| offset)
            .collect();
        for offset in occurrences {
            let rects = span_rects(&chars, offset, offset + placeholder.len());
            if rects.is_empty() {
                continue;
            }
            remove_covered_text(&mut page, &rects);
            if let Some(first) = rects.first() {
                insert_text(document, &mut page, fonts, first, original)?;
            }
            restored += 1;
        }
    }

    Ok(restored)
}
