//! Scoped suppression of parser notifications.
//!
//! The external parser posts a message for every run it loads whenever its
//! `JournalParser.conf` is present. Bulk ingestion moves that file to
//! `JournalParser.conf.temp` for the lifetime of a [`NotificationGuard`] and
//! moves it back when the guard is released or dropped.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

const TEMP_SUFFIX: &str = ".temp";

/// Holds the notification config renamed away until released.
#[derive(Debug)]
pub struct NotificationGuard {
    config_path: PathBuf,
    temp_path: PathBuf,
    released: bool,
}

impl NotificationGuard {
    /// Rename `config_path` out of the way if it exists. A missing config
    /// file is fine: the parser is silent without it.
    pub fn acquire(config_path: &Path) -> io::Result<Self> {
        let temp_path = temp_path_for(config_path);
        if config_path.exists() {
            std::fs::rename(config_path, &temp_path)?;
            info!(config = %config_path.display(), "notifications suppressed");
        } else {
            debug!(config = %config_path.display(), "no notification config present");
        }
        Ok(Self {
            config_path: config_path.to_path_buf(),
            temp_path,
            released: false,
        })
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Put the config file back. Also restores a `.temp` left behind by an
    /// earlier run that never got to clean up.
    pub fn release(mut self) -> io::Result<()> {
        self.restore()
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        if self.temp_path.exists() {
            std::fs::rename(&self.temp_path, &self.config_path)?;
            info!(config = %self.config_path.display(), "notifications restored");
        }
        Ok(())
    }
}

impl Drop for NotificationGuard {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!(
                error = %e,
                temp = %self.temp_path.display(),
                "failed to restore notification config"
            );
        }
    }
}

fn temp_path_for(config_path: &Path) -> PathBuf {
    let mut name: OsString = config_path.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}
