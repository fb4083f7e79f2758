//! Journal file naming: `journal_<year>_<cycle>.xml`.
//!
//! The year-cycle segment of the name is the only thing the external parser
//! needs to locate a journal, so everything here is string handling on file
//! names. Names that do not follow the pattern are rejected rather than
//! guessed at.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};

pub const JOURNAL_PREFIX: &str = "journal_";
pub const JOURNAL_SUFFIX: &str = ".xml";
/// Prefix the parser expects in front of the year-cycle label.
pub const CYCLE_ARG_PREFIX: &str = "cycle_";

/// True when `name` is `journal_<digits>_<digits>.xml`.
pub fn is_journal_name(name: &str) -> bool {
    split_year_cycle(name).is_some()
}

fn split_year_cycle(name: &str) -> Option<(&str, &str)> {
    let middle = name
        .strip_prefix(JOURNAL_PREFIX)?
        .strip_suffix(JOURNAL_SUFFIX)?;
    let (year, cycle) = middle.split_once('_')?;
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if numeric(year) && numeric(cycle) {
        Some((year, cycle))
    } else {
        None
    }
}

/// Extract the year-cycle label from a journal file name.
///
/// `journal_21_1.xml` yields `21_1`. Anything that does not match the strict
/// pattern is an [`JournalError::InvalidJournalName`].
pub fn cycle_label(name: &str) -> Result<String> {
    match split_year_cycle(name) {
        Some((year, cycle)) => Ok(format!("{year}_{cycle}")),
        None => Err(JournalError::InvalidJournalName(name.to_string())),
    }
}

/// A journal file that passed name validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalFile {
    /// Bare file name, e.g. `journal_21_1.xml`.
    pub name: String,
    /// Full path on disk.
    pub path: PathBuf,
    /// Year-cycle label, e.g. `21_1`.
    pub year_cycle: String,
}

impl JournalFile {
    /// Build from an entry relative to `data_dir`. Absolute entries keep
    /// their own location; only the final path component is validated.
    pub fn resolve(data_dir: &Path, entry: &str) -> Result<Self> {
        let path = data_dir.join(entry);
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| JournalError::InvalidJournalName(entry.to_string()))?
            .to_string();
        let year_cycle = cycle_label(&name)?;
        Ok(Self {
            name,
            path,
            year_cycle,
        })
    }

    /// Directory the file actually lives in. The parser rebuilds the journal
    /// path from this and the cycle label, so it must be this directory and
    /// not the configured data dir.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// The `cycle_<year>_<cycle>` argument passed to the parser.
    pub fn cycle_arg(&self) -> String {
        format!("{CYCLE_ARG_PREFIX}{}", self.year_cycle)
    }
}

/// Which runs of a journal the parser should load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunSelector {
    /// Every run in the cycle file (`*`).
    All,
    /// A single run, rendered as eight zero-padded digits.
    Run(u32),
}

impl fmt::Display for RunSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunSelector::All => f.write_str("*"),
            RunSelector::Run(n) => write!(f, "{n:08}"),
        }
    }
}
