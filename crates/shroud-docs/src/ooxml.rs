//! Shared OOXML plumbing for the DOCX and XLSX handlers: zip archive
//! round-trip and XML event parsing.
//!
//! Rewriting copies every untouched archive entry verbatim (raw, without
//! recompression) so styles, relationships, media, and metadata survive
//! byte-for-byte; only the entries we edited are re-encoded.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use shroud_core::errors::DocumentError;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn open_archive(path: &Path) -> Result<ZipArchive<File>, DocumentError> {
    let file = File::open(path).map_err(DocumentError::Io)?;
    ZipArchive::new(file).map_err(|err| DocumentError::CorruptedDocument {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Names of every entry in the archive, in stored order.
pub(crate) fn entry_names(path: &Path) -> Result<Vec<String>, DocumentError> {
    let archive = open_archive(path)?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Read one entry's bytes. Missing entries mean the document is not what
/// its extension claims.
pub(crate) fn read_entry(path: &Path, entry: &str) -> Result<Vec<u8>, DocumentError> {
    let mut archive = open_archive(path)?;
    let mut file = archive
        .by_name(entry)
        .map_err(|err| DocumentError::CorruptedDocument {
            path: path.to_path_buf(),
            reason: format!("missing {entry}: {err}"),
        })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(DocumentError::Io)?;
    Ok(bytes)
}

/// Copy `input` to `output`, replacing the entries named in `replacements`
/// and raw-copying everything else. The write is atomic.
pub(crate) fn rewrite_archive(
    input: &Path,
    output: &Path,
    replacements: &HashMap<String, Vec<u8>>,
) -> Result<(), DocumentError> {
    let mut archive = open_archive(input)?;

    let dir = output.parent().filter(|p| !p.as_os_str().is_empty());
    let tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new()?,
    };
    let mut writer = ZipWriter::new(tmp.as_file().try_clone().map_err(DocumentError::Io)?);

    for index in 0..archive.len() {
        let name = {
            let file = archive
                .by_index_raw(index)
                .map_err(|err| corrupted(input, &err.to_string()))?;
            file.name().to_string()
        };
        match replacements.get(&name) {
            Some(bytes) => {
                writer
                    .start_file(name, SimpleFileOptions::default())
                    .map_err(|err| corrupted(input, &err.to_string()))?;
                writer.write_all(bytes).map_err(DocumentError::Io)?;
            }
            None => {
                let file = archive
                    .by_index_raw(index)
                    .map_err(|err| corrupted(input, &err.to_string()))?;
                writer
                    .raw_copy_file(file)
                    .map_err(|err| corrupted(input, &err.to_string()))?;
            }
        }
    }

    writer
        .finish()
        .map_err(|err| corrupted(input, &err.to_string()))?;
    tmp.persist(output)
        .map_err(|err| DocumentError::Io(err.error))?;
    Ok(())
}

fn corrupted(path: &Path, reason: &str) -> DocumentError {
    DocumentError::CorruptedDocument {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Parse an XML document into owned events.
pub(crate) fn parse_events(xml: &[u8]) -> Result<Vec<Event<'static>>, String> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut events = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(event) => events.push(event.into_owned()),
            Err(err) => return Err(err.to_string()),
        }
        buf.clear();
    }
    Ok(events)
}

/// Serialize events back to XML bytes.
pub(crate) fn write_events<'a, I>(events: I) -> Result<Vec<u8>, String>
where
    I: IntoIterator<Item = Event<'a>>,
{
    let mut writer = Writer::new(Vec::new());
    for event in events {
        writer.write_event(event).map_err(|err| err.to_string())?;
    }
    Ok(writer.into_inner())
}
