//! Pre-flight inspection of journal XML.
//!
//! The parser owns journal semantics; this module only answers two
//! questions before handing a file over: is it well-formed XML, and which
//! `/NXroot/NXentry` run names does it contain.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::encoding::Decoder;
use quick_xml::reader::Reader;
use thiserror::Error;

const ROOT_ELEMENT: &[u8] = b"NXroot";
const ENTRY_ELEMENT: &[u8] = b"NXentry";

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("cannot read journal: {0}")]
    Read(#[from] std::io::Error),

    #[error("XML error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("unbalanced element structure")]
    Unbalanced,

    #[error("document has no root element")]
    Empty,

    #[error("run name '{0}' has no numeric run number")]
    BadRunName(String),
}

/// What the journal looks like from the outside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalSummary {
    pub root: String,
    /// `name` attributes of the `NXentry` children of an `NXroot` root,
    /// in document order.
    pub entries: Vec<String>,
}

impl JournalSummary {
    /// Run numbers for `instrument`, taken from entry names such as
    /// `ENGINX00012345`. Entries for other prefixes are ignored.
    pub fn run_numbers(&self, instrument: &str) -> Result<Vec<u32>, InspectError> {
        self.entries
            .iter()
            .filter_map(|name| name.strip_prefix(instrument).map(|rest| (name, rest)))
            .map(|(name, rest)| {
                rest.trim()
                    .parse::<u32>()
                    .map_err(|_| InspectError::BadRunName(name.clone()))
            })
            .collect()
    }
}

/// Inspect a journal on disk. The bytes go to the XML reader untouched so
/// the `encoding` declaration (commonly ISO-8859-1) decides how they read.
pub fn inspect_file(path: &Path) -> Result<JournalSummary, InspectError> {
    let bytes = std::fs::read(path)?;
    inspect_bytes(&bytes)
}

/// Check well-formedness and collect entry names in one pass.
pub fn inspect_bytes(bytes: &[u8]) -> Result<JournalSummary, InspectError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut summary = JournalSummary::default();
    let mut depth: usize = 0;
    let mut seen_root = false;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| InspectError::Syntax {
                position: reader.error_position() as u64,
                message: e.to_string(),
            })?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                if depth == 0 {
                    if seen_root {
                        return Err(InspectError::Unbalanced);
                    }
                    seen_root = true;
                    summary.root = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                } else if depth == 1
                    && summary.root.as_bytes() == ROOT_ELEMENT
                    && e.name().as_ref() == ENTRY_ELEMENT
                {
                    if let Some(name) = entry_name(e, reader.decoder()) {
                        summary.entries.push(name);
                    }
                }
                if !is_empty {
                    depth += 1;
                }
            }
            Event::End(_) => {
                depth = depth.checked_sub(1).ok_or(InspectError::Unbalanced)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(InspectError::Empty);
    }
    if depth != 0 {
        return Err(InspectError::Unbalanced);
    }
    Ok(summary)
}

fn entry_name(e: &BytesStart<'_>, decoder: Decoder) -> Option<String> {
    let attr = e.try_get_attribute("name").ok()??;
    let value = decoder.decode(&attr.value).ok()?;
    Some(value.trim().to_string())
}
