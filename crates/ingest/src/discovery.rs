//! Journal file discovery.
//!
//! Without an explicit list, only the top level of the data directory is
//! scanned and names are filtered with [`journal_core::is_journal_name`].
//! Processing order is whatever the directory listing yields.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use journal_core::is_journal_name;

use crate::error::IngestError;

/// File names to process, relative to `data_dir`.
///
/// An explicit list is returned untouched; names are validated later, one
/// file at a time, so a bad entry does not hide the good ones.
pub fn discover(data_dir: &Path, explicit: Option<&[String]>) -> Result<Vec<String>, IngestError> {
    if let Some(files) = explicit {
        return Ok(files.to_vec());
    }

    let metadata = std::fs::metadata(data_dir).map_err(|source| IngestError::DataDir {
        path: data_dir.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(IngestError::DataDir {
            path: data_dir.to_path_buf(),
            source: std::io::Error::other("not a directory"),
        });
    }

    let mut names = Vec::new();
    for entry in WalkDir::new(data_dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "walkdir error, skipping entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if is_journal_name(name) {
            names.push(name.to_string());
        } else {
            debug!(name, "not a journal file, skipping");
        }
    }
    Ok(names)
}
