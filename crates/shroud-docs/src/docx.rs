//! DOCX projection: per-paragraph run surgery.
//!
//! Each paragraph's text is the concatenation of its runs. The engine is
//! called once per paragraph; accepted spans are spliced back into the run
//! texts right-to-left so earlier offsets stay valid while the text
//! shortens or lengthens. A span inside one run touches only that run; a
//! span crossing runs writes `prefix + placeholder` into the first affected
//! run (which keeps its formatting), clears the interior runs, and leaves
//! the suffix in the last. Paragraphs whose text does not decompose into
//! runs (non-run content between runs) fall back to writing the whole
//! redacted paragraph into the first run and clearing the rest.
//!
//! Table-cell paragraphs are ordinary `w:p` elements and are processed the
//! same way.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use shroud_core::errors::DocumentError;
use shroud_core::{EntityType, ShroudResult};
use shroud_engine::RedactionEngine;
use tracing::warn;

use crate::{merge_into_session, ooxml, DocumentHandler, RedactSummary, UnredactSummary};

const DOCUMENT_XML: &str = "word/document.xml";

pub struct DocxHandler;

impl DocumentHandler for DocxHandler {
    fn redact(
        &self,
        engine: &RedactionEngine,
        input: &Path,
        output: &Path,
        entity_types: Option<&[EntityType]>,
        _use_placeholders: bool,
    ) -> ShroudResult<RedactSummary> {
        let xml = ooxml::read_entry(input, DOCUMENT_XML)?;
        let events = ooxml::parse_events(&xml).map_err(|reason| corrupted(input, &reason))?;
        let paragraphs = parse_paragraphs(&events);

        let session_id = engine.sessions().create();
        let mut entities_found = 0;
        let mut edits: EditPlan = HashMap::new();

        for paragraph in &paragraphs {
            let full_text = paragraph.full_text();
            if full_text.trim().is_empty() {
                continue;
            }
            let result = engine.redact(&full_text, entity_types);
            if result.entities_found == 0 {
                continue;
            }
            entities_found += result.entities_found;
            merge_into_session(engine, &session_id, &result.session_id);

            if paragraph.decomposes_into_runs() {
                plan_run_splices(paragraph, &result, &mut edits);
            } else {
                // Unusual DOCX with text outside runs: surgical offsets
                // would not line up, so replace the paragraph wholesale.
                plan_fallback(paragraph, &result.redacted_text, &mut edits);
            }
        }

        let patched =
            render_with_edits(&events, &edits).map_err(|reason| corrupted(input, &reason))?;
        let replacements = HashMap::from([(DOCUMENT_XML.to_string(), patched)]);
        ooxml::rewrite_archive(input, output, &replacements)?;

        Ok(RedactSummary {
            session_id: Some(session_id),
            entities_found,
        })
    }

    fn unredact(
        &self,
        input: &Path,
        output: &Path,
        mappings: &HashMap<String, String>,
    ) -> ShroudResult<UnredactSummary> {
        let xml = ooxml::read_entry(input, DOCUMENT_XML)?;
        let events = ooxml::parse_events(&xml).map_err(|reason| corrupted(input, &reason))?;
        let paragraphs = parse_paragraphs(&events);

        let mut entities_restored = 0;
        let mut edits: EditPlan = HashMap::new();

        for paragraph in &paragraphs {
            let full_text = paragraph.full_text();
            let present: Vec<(&String, &String)> = mappings
                .iter()
                .filter(|(placeholder, _)| full_text.contains(placeholder.as_str()))
                .collect();
            if present.is_empty() {
                continue;
            }
            entities_restored += present.len();

            let mut texts = paragraph.run_texts();
            let mut changed = vec![false; texts.len()];
            for (run, text) in texts.iter_mut().enumerate() {
                for (placeholder, original) in &present {
                    if text.contains(placeholder.as_str()) {
                        *text = text.replace(placeholder.as_str(), original);
                        changed[run] = true;
                    }
                }
            }

            // A placeholder that straddles run boundaries survives per-run
            // replacement; restore the whole paragraph instead.
            let combined: String = texts.concat();
            let straddled = present
                .iter()
                .any(|(placeholder, _)| combined.contains(placeholder.as_str()));
            if straddled {
                let mut restored = full_text.clone();
                for (placeholder, original) in &present {
                    restored = restored.replace(placeholder.as_str(), original);
                }
                plan_fallback(paragraph, &restored, &mut edits);
            } else {
                for (run, text) in texts.iter().enumerate() {
                    if changed[run] {
                        plan_run_rewrite(paragraph, run, text, &mut edits);
                    }
                }
            }
        }

        let patched =
            render_with_edits(&events, &edits).map_err(|reason| corrupted(input, &reason))?;
        let replacements = HashMap::from([(DOCUMENT_XML.to_string(), patched)]);
        ooxml::rewrite_archive(input, output, &replacements)?;

        Ok(UnredactSummary { entities_restored })
    }
}

fn corrupted(path: &Path, reason: &str) -> DocumentError {
    DocumentError::CorruptedDocument {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

// ── Paragraph model ───────────────────────────────────────────────────────

/// One `<w:t>` element inside a paragraph.
struct TextElement {
    /// Event index of the `Start` (or `Empty`) event.
    start: usize,
    /// Event index of the matching `End` event; equals `start` for `Empty`.
    end: usize,
    text: String,
    /// Enclosing run index, or `None` for text outside any `w:r`.
    run: Option<usize>,
}

struct Paragraph {
    elements: Vec<TextElement>,
    run_count: usize,
}

impl Paragraph {
    /// Concatenation of every text element, in document order.
    fn full_text(&self) -> String {
        self.elements.iter().map(|el| el.text.as_str()).collect()
    }

    /// Per-run text, concatenating a run's text elements.
    fn run_texts(&self) -> Vec<String> {
        let mut texts = vec![String::new(); self.run_count];
        for element in &self.elements {
            if let Some(run) = element.run {
                texts[run].push_str(&element.text);
            }
        }
        texts
    }

    /// True when every piece of paragraph text lives inside a run, i.e.
    /// run concatenation reproduces the paragraph text exactly.
    fn decomposes_into_runs(&self) -> bool {
        self.elements
            .iter()
            .all(|el| el.run.is_some() || el.text.is_empty())
    }

    /// `(start_offset, end_offset)` of each run within the paragraph text.
    fn run_table(&self) -> Vec<(usize, usize)> {
        let mut table = Vec::with_capacity(self.run_count);
        let mut offset = 0;
        for text in self.run_texts() {
            table.push((offset, offset + text.len()));
            offset += text.len();
        }
        table
    }

    fn elements_of_run(&self, run: usize) -> Vec<&TextElement> {
        self.elements
            .iter()
            .filter(|el| el.run == Some(run))
            .collect()
    }
}

/// Extract every paragraph from the event stream.
fn parse_paragraphs(events: &[Event<'_>]) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut index = 0;
    while index < events.len() {
        if let Event::Start(start) = &events[index] {
            if start.name().as_ref() == b"w:p" {
                let (paragraph, next) = parse_paragraph(events, index);
                paragraphs.push(paragraph);
                index = next;
                continue;
            }
        }
        index += 1;
    }
    paragraphs
}

fn parse_paragraph(events: &[Event<'_>], start: usize) -> (Paragraph, usize) {
    let mut elements = Vec::new();
    let mut run_count = 0;
    let mut current_run: Option<usize> = None;
    let mut index = start + 1;

    while index < events.len() {
        match &events[index] {
            Event::Start(element) => match element.name().as_ref() {
                b"w:r" => {
                    current_run = Some(run_count);
                    run_count += 1;
                }
                b"w:t" => {
                    let (text, end) = collect_text(events, index);
                    elements.push(TextElement {
                        start: index,
                        end,
                        text,
                        run: current_run,
                    });
                    index = end;
                }
                _ => {}
            },
            Event::Empty(element) => match element.name().as_ref() {
                b"w:r" => {
                    run_count += 1;
                }
                b"w:t" => {
                    elements.push(TextElement {
                        start: index,
                        end: index,
                        text: String::new(),
                        run: current_run,
                    });
                }
                _ => {}
            },
            Event::End(element) => match element.name().as_ref() {
                b"w:r" => current_run = None,
                b"w:p" => {
                    return (
                        Paragraph {
                            elements,
                            run_count,
                        },
                        index + 1,
                    );
                }
                _ => {}
            },
            _ => {}
        }
        index += 1;
    }

    (
        Paragraph {
            elements,
            run_count,
        },
        index,
    )
}

/// Gather the text content of a `<w:t>` starting at `start`; returns the
/// content and the index of the closing event.
fn collect_text(events: &[Event<'_>], start: usize) -> (String, usize) {
    let mut text = String::new();
    let mut index = start + 1;
    while index < events.len() {
        match &events[index] {
            Event::Text(chunk) => {
                if let Ok(content) = chunk.unescape() {
                    text.push_str(&content);
                }
            }
            Event::End(element) if element.name().as_ref() == b"w:t" => break,
            _ => {}
        }
        index += 1;
    }
    (text, index)
}

// ── Edit planning ─────────────────────────────────────────────────────────

enum Edit {
    /// Replace the element's content with this text.
    Rewrite(String),
    /// Remove the element entirely.
    Drop,
}

/// Element start-event index → (element end-event index, edit).
type EditPlan = HashMap<usize, (usize, Edit)>;

/// Splice each accepted span into the run texts, right-to-left.
fn plan_run_splices(
    paragraph: &Paragraph,
    result: &shroud_engine::RedactionOutcome,
    edits: &mut EditPlan,
) {
    let table = paragraph.run_table();
    let mut texts = paragraph.run_texts();
    let mut changed = vec![false; texts.len()];

    for entity in result.entities.iter().rev() {
        let span_start = entity.original_start;
        let span_end = entity.original_end;
        let first = table
            .iter()
            .position(|&(start, end)| start <= span_start && span_start < end);
        let last = table
            .iter()
            .position(|&(start, end)| start < span_end && span_end <= end);
        let (Some(first), Some(last)) = (first, last) else {
            warn!(
                placeholder = %entity.placeholder,
                "span does not map onto runs; skipping splice"
            );
            continue;
        };

        if first == last {
            let local_start = span_start - table[first].0;
            let local_end = span_end - table[first].0;
            texts[first].replace_range(local_start..local_end, &entity.placeholder);
            changed[first] = true;
        } else {
            let local_start = span_start - table[first].0;
            let local_end = span_end - table[last].0;
            let suffix = texts[last][local_end..].to_string();
            texts[last] = suffix;
            changed[last] = true;
            for interior in first + 1..last {
                texts[interior].clear();
                changed[interior] = true;
            }
            texts[first].truncate(local_start);
            texts[first].push_str(&entity.placeholder);
            changed[first] = true;
        }
    }

    for (run, text) in texts.iter().enumerate() {
        if changed[run] {
            plan_run_rewrite(paragraph, run, text, edits);
        }
    }
}

/// Put `text` into the run's first text element and drop the others.
fn plan_run_rewrite(paragraph: &Paragraph, run: usize, text: &str, edits: &mut EditPlan) {
    let elements = paragraph.elements_of_run(run);
    let Some((first, rest)) = elements.split_first() else {
        return;
    };
    edits.insert(first.start, (first.end, Edit::Rewrite(text.to_string())));
    for element in rest {
        edits.insert(element.start, (element.end, Edit::Drop));
    }
}

/// Whole-paragraph replacement: `text` goes into the first text element,
/// every other text element is dropped.
fn plan_fallback(paragraph: &Paragraph, text: &str, edits: &mut EditPlan) {
    let mut elements = paragraph.elements.iter();
    let Some(first) = elements.next() else {
        return;
    };
    edits.insert(first.start, (first.end, Edit::Rewrite(text.to_string())));
    for element in elements {
        edits.insert(element.start, (element.end, Edit::Drop));
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────

/// Serialize the event stream, applying planned element edits.
fn render_with_edits(events: &[Event<'_>], edits: &EditPlan) -> Result<Vec<u8>, String> {
    let mut out: Vec<Event<'_>> = Vec::with_capacity(events.len());
    let mut index = 0;
    while index < events.len() {
        if let Some((end, edit)) = edits.get(&index) {
            match edit {
                Edit::Rewrite(text) => {
                    out.push(Event::Start(text_element_start(&events[index])));
                    out.push(Event::Text(BytesText::new(text).into_owned()));
                    out.push(Event::End(BytesEnd::new("w:t")));
                }
                Edit::Drop => {}
            }
            index = *end + 1;
            continue;
        }
        out.push(events[index].clone());
        index += 1;
    }
    ooxml::write_events(out)
}

/// A `<w:t>` start tag carrying the original attributes plus
/// `xml:space="preserve"` so leading/trailing spaces survive.
fn text_element_start(original: &Event<'_>) -> BytesStart<'static> {
    let mut element = BytesStart::new("w:t");
    let attrs = match original {
        Event::Start(start) => Some(start.attributes()),
        Event::Empty(empty) => Some(empty.attributes()),
        _ => None,
    };
    if let Some(attrs) = attrs {
        for attr in attrs.flatten() {
            if attr.key.as_ref() != b"xml:space" {
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = String::from_utf8_lossy(&attr.value).into_owned();
                element.push_attribute((key.as_str(), value.as_str()));
            }
        }
    }
    element.push_attribute(("xml:space", "preserve"));
    element
}
