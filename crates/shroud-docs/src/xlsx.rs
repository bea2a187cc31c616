//! XLSX projection: per-cell redaction over shared and inline strings.
//!
//! Cell values live either in the shared-string table
//! (`xl/sharedStrings.xml`, referenced by index from `t="s"` cells) or
//! inline in the sheet (`t="inlineStr"`). Inline cells get one engine call
//! each and are rewritten in place. Shared entries get one engine call at
//! their first referencing cell and the redacted text is written into the
//! entry itself, which covers every cell that references it. Styles,
//! formulas, merged ranges, and sheet order are untouched because only
//! string content is edited.
//!
//! One session is created up front; each per-cell session is folded into it.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use shroud_core::errors::DocumentError;
use shroud_core::{EntityType, ShroudResult};
use shroud_engine::RedactionEngine;
use tracing::warn;

use crate::{apply_mappings, merge_into_session, ooxml, DocumentHandler, RedactSummary, UnredactSummary};

const SHARED_STRINGS: &str = "xl/sharedStrings.xml";

pub struct XlsxHandler;

impl DocumentHandler for XlsxHandler {
    fn redact(
        &self,
        engine: &RedactionEngine,
        input: &Path,
        output: &Path,
        entity_types: Option<&[EntityType]>,
        _use_placeholders: bool,
    ) -> ShroudResult<RedactSummary> {
        let entries = ooxml::entry_names(input)?;
        let shared = match entries.iter().any(|name| name == SHARED_STRINGS) {
            true => {
                let xml = ooxml::read_entry(input, SHARED_STRINGS)?;
                let events = ooxml::parse_events(&xml).map_err(|r| corrupted(input, &r))?;
                parse_shared_strings(&events)
            }
            false => Vec::new(),
        };

        let session_id = engine.sessions().create();
        let mut entities_found = 0;
        // Shared-string index → redacted replacement (first cell wins).
        let mut scrubbed: HashMap<usize, String> = HashMap::new();
        let mut replacements: HashMap<String, Vec<u8>> = HashMap::new();

        for entry in entries.iter().filter(|name| is_sheet(name)) {
            let xml = ooxml::read_entry(input, entry)?;
            let events = match ooxml::parse_events(&xml) {
                Ok(events) => events,
                Err(reason) => {
                    warn!(sheet = entry.as_str(), %reason, "skipping unparseable sheet");
                    continue;
                }
            };
            let outcome = redact_sheet(
                engine,
                &events,
                &shared,
                entity_types,
                &session_id,
                &mut scrubbed,
            );
            entities_found += outcome.entities_found;
            if outcome.edited {
                let bytes = ooxml::write_events(outcome.events).map_err(|r| corrupted(input, &r))?;
                replacements.insert(entry.clone(), bytes);
            }
        }

        if !scrubbed.is_empty() {
            let xml = ooxml::read_entry(input, SHARED_STRINGS)?;
            let events = ooxml::parse_events(&xml).map_err(|r| corrupted(input, &r))?;
            let patched = scrub_shared_strings(&events, &scrubbed);
            let bytes = ooxml::write_events(patched).map_err(|r| corrupted(input, &r))?;
            replacements.insert(SHARED_STRINGS.to_string(), bytes);
        }

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
        let entries = ooxml::entry_names(input)?;
        let mut entities_restored = 0;
        let mut replacements: HashMap<String, Vec<u8>> = HashMap::new();

        if entries.iter().any(|name| name == SHARED_STRINGS) {
            let xml = ooxml::read_entry(input, SHARED_STRINGS)?;
            let events = ooxml::parse_events(&xml).map_err(|r| corrupted(input, &r))?;
            let (patched, restored, edited) = restore_text_elements(&events, mappings);
            entities_restored += restored;
            if edited {
                let bytes = ooxml::write_events(patched).map_err(|r| corrupted(input, &r))?;
                replacements.insert(SHARED_STRINGS.to_string(), bytes);
            }
        }

        for entry in entries.iter().filter(|name| is_sheet(name)) {
            let xml = ooxml::read_entry(input, entry)?;
            let events = match ooxml::parse_events(&xml) {
                Ok(events) => events,
                Err(reason) => {
                    warn!(sheet = entry.as_str(), %reason, "skipping unparseable sheet");
                    continue;
                }
            };
            let (patched, restored, edited) = restore_text_elements(&events, mappings);
            entities_restored += restored;
            if edited {
                let bytes = ooxml::write_events(patched).map_err(|r| corrupted(input, &r))?;
                replacements.insert(entry.clone(), bytes);
            }
        }

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

fn is_sheet(name: &str) -> bool {
    name.starts_with("xl/worksheets/") && name.ends_with(".xml")
}

fn local_name(event: &BytesStart<'_>) -> Vec<u8> {
    event.local_name().as_ref().to_vec()
}

/// Shared-string entries in table order. Rich-text runs inside an entry
/// are flattened to their concatenated text.
fn parse_shared_strings(events: &[Event<'_>]) -> Vec<String> {
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    for event in events {
        match event {
            Event::Start(start) => match local_name(start).as_slice() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = current.is_some(),
                _ => {}
            },
            Event::Text(chunk) => {
                if in_text {
                    if let (Some(buffer), Ok(content)) = (current.as_mut(), chunk.unescape()) {
                        buffer.push_str(&content);
                    }
                }
            }
            Event::End(end) => match end.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => {
                    if let Some(done) = current.take() {
                        strings.push(done);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
    strings
}

struct SheetOutcome<'a> {
    events: Vec<Event<'a>>,
    entities_found: usize,
    edited: bool,
}

/// Walk a sheet, calling the engine once per string-valued cell.
fn redact_sheet<'a>(
    engine: &RedactionEngine,
    events: &[Event<'a>],
    shared: &[String],
    entity_types: Option<&[EntityType]>,
    session_id: &str,
    scrubbed: &mut HashMap<usize, String>,
) -> SheetOutcome<'a> {
    let mut out: Vec<Event<'a>> = Vec::with_capacity(events.len());
    let mut entities_found = 0;
    let mut edited = false;
    let mut index = 0;

    while index < events.len() {
        let cell_start = match &events[index] {
            Event::Start(start) if local_name(start).as_slice() == b"c" => start.clone(),
            _ => {
                out.push(events[index].clone());
                index += 1;
                continue;
            }
        };
        let cell_end = matching_end(events, index, b"c");
        let cell_type = attribute(&cell_start, b"t").unwrap_or_default();

        match cell_type.as_str() {
            // Shared string: redact through the shared-string table. The
            // cell keeps its reference, so nothing in the sheet changes.
            // Each entry is processed once, at its first referencing cell;
            // further references would recount the same entities and merge
            // mappings that never reach the table.
            "s" => {
                if let Some(shared_index) = collect_element_text(events, index, cell_end, b"v")
                    .and_then(|v| v.trim().parse::<usize>().ok())
                {
                    if !scrubbed.contains_key(&shared_index) {
                        if let Some(value) = shared.get(shared_index) {
                            if !value.trim().is_empty() {
                                let result = engine.redact(value, entity_types);
                                if result.entities_found > 0 {
                                    entities_found += result.entities_found;
                                    merge_into_session(engine, session_id, &result.session_id);
                                    scrubbed.insert(shared_index, result.redacted_text);
                                }
                            }
                        }
                    }
                }
                out.extend(events[index..=cell_end].iter().cloned());
            }
            // Inline string: rewrite the cell content in place.
            "inlineStr" => {
                let value = collect_element_text(events, index, cell_end, b"t").unwrap_or_default();
                if value.trim().is_empty() {
                    out.extend(events[index..=cell_end].iter().cloned());
                } else {
                    let result = engine.redact(&value, entity_types);
                    if result.entities_found > 0 {
                        entities_found += result.entities_found;
                        merge_into_session(engine, session_id, &result.session_id);
                        push_inline_cell(&mut out, &cell_start, &result.redacted_text);
                        edited = true;
                    } else {
                        out.extend(events[index..=cell_end].iter().cloned());
                    }
                }
            }
            // Numbers, booleans, formula results: formatting and formulas
            // are preserved by leaving the cell alone.
            _ => out.extend(events[index..=cell_end].iter().cloned()),
        }

        index = cell_end + 1;
    }

    SheetOutcome {
        events: out,
        entities_found,
        edited,
    }
}

/// Rewrite `<si>` entries named in `scrubbed` as plain-text entries.
fn scrub_shared_strings<'a>(
    events: &[Event<'a>],
    scrubbed: &HashMap<usize, String>,
) -> Vec<Event<'a>> {
    let mut out: Vec<Event<'a>> = Vec::with_capacity(events.len());
    let mut si_index = 0usize;
    let mut index = 0;
    while index < events.len() {
        let is_si = matches!(&events[index], Event::Start(start) if local_name(start).as_slice() == b"si");
        if is_si {
            let end = matching_end(events, index, b"si");
            match scrubbed.get(&si_index) {
                Some(replacement) => {
                    out.push(Event::Start(BytesStart::new("si")));
                    push_text_element(&mut out, replacement);
                    out.push(Event::End(BytesEnd::new("si")));
                }
                None => out.extend(events[index..=end].iter().cloned()),
            }
            si_index += 1;
            index = end + 1;
            continue;
        }
        out.push(events[index].clone());
        index += 1;
    }
    out
}

/// Apply session mappings to every `<t>` element. Returns the patched
/// events, the number of distinct placeholders restored, and whether
/// anything changed.
fn restore_text_elements<'a>(
    events: &[Event<'a>],
    mappings: &HashMap<String, String>,
) -> (Vec<Event<'a>>, usize, bool) {
    let mut out: Vec<Event<'a>> = Vec::with_capacity(events.len());
    let mut restored = 0;
    let mut edited = false;
    let mut index = 0;

    while index < events.len() {
        let is_text = matches!(&events[index], Event::Start(start) if local_name(start).as_slice() == b"t");
        if !is_text {
            out.push(events[index].clone());
            index += 1;
            continue;
        }
        let end = matching_end(events, index, b"t");
        let mut text = String::new();
        for event in &events[index + 1..end] {
            if let Event::Text(chunk) = event {
                if let Ok(content) = chunk.unescape() {
                    text.push_str(&content);
                }
            }
        }
        let (new_text, count) = apply_mappings(&text, mappings);
        if count > 0 {
            restored += count;
            edited = true;
            push_text_element(&mut out, &new_text);
        } else {
            out.extend(events[index..=end].iter().cloned());
        }
        index = end + 1;
    }

    (out, restored, edited)
}

/// Index of the `End` event matching the `Start` at `start`.
fn matching_end(events: &[Event<'_>], start: usize, name: &[u8]) -> usize {
    let mut depth = 0usize;
    let mut index = start;
    while index < events.len() {
        match &events[index] {
            Event::Start(s) if s.local_name().as_ref() == name => depth += 1,
            Event::End(e) if e.local_name().as_ref() == name => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return index;
                }
            }
            _ => {}
        }
        index += 1;
    }
    events.len().saturating_sub(1)
}

/// Text of the first `name` child element within the cell's event range.
fn collect_element_text(
    events: &[Event<'_>],
    start: usize,
    end: usize,
    name: &[u8],
) -> Option<String> {
    let mut collecting = false;
    let mut found = false;
    let mut text = String::new();
    for event in &events[start..=end] {
        match event {
            Event::Start(s) if s.local_name().as_ref() == name => {
                collecting = true;
                found = true;
            }
            Event::End(e) if e.local_name().as_ref() == name => collecting = false,
            Event::Text(chunk) if collecting => {
                if let Ok(content) = chunk.unescape() {
                    text.push_str(&content);
                }
            }
            _ => {}
        }
    }
    found.then_some(text)
}

fn attribute(start: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// `<c ...attrs t="inlineStr"><is><t xml:space="preserve">text</t></is></c>`
fn push_inline_cell<'a>(out: &mut Vec<Event<'a>>, original: &BytesStart<'_>, text: &str) {
    let mut cell = BytesStart::new("c");
    for attr in original.attributes().flatten() {
        if attr.key.as_ref() != b"t" {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = String::from_utf8_lossy(&attr.value).into_owned();
            cell.push_attribute((key.as_str(), value.as_str()));
        }
    }
    cell.push_attribute(("t", "inlineStr"));
    out.push(Event::Start(cell));
    out.push(Event::Start(BytesStart::new("is")));
    push_text_element(out, text);
    out.push(Event::End(BytesEnd::new("is")));
    out.push(Event::End(BytesEnd::new("c")));
}

/// `<t xml:space="preserve">text</t>`
fn push_text_element<'a>(out: &mut Vec<Event<'a>>, text: &str) {
    let mut element = BytesStart::new("t");
    element.push_attribute(("xml:space", "preserve"));
    out.push(Event::Start(element));
    out.push(Event::Text(BytesText::new(text).into_owned()));
    out.push(Event::End(BytesEnd::new("t")));
}
