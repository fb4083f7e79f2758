use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env_opt(key).as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

/// Directory holding the running binary, falling back to the working directory.
pub fn install_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

// ── External parser ───────────────────────────────────────────

pub const PARSER_CONFIG_NAME: &str = "JournalParser.conf";

#[cfg(windows)]
pub const PARSER_EXE_NAME: &str = "JournalParser.exe";
#[cfg(not(windows))]
pub const PARSER_EXE_NAME: &str = "JournalParser";

/// Location and behaviour of the external `JournalParser` executable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    pub executable: PathBuf,
    /// Notification config read by the parser; renamed away during ingestion.
    pub config_file: PathBuf,
    /// Pass `JOURNALPARSER_NOMESSAGE=1` to the child process.
    pub suppress_messages: bool,
    /// Discard the child's stdout.
    pub quiet: bool,
}

impl ParserConfig {
    /// Default layout: `<install>/../bin/windows-x64/`.
    pub fn default_dir() -> PathBuf {
        install_dir().join("..").join("bin").join("windows-x64")
    }

    /// Paths rooted at `dir`, all other settings at their defaults.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            executable: dir.join(PARSER_EXE_NAME),
            config_file: dir.join(PARSER_CONFIG_NAME),
            suppress_messages: true,
            quiet: true,
        }
    }

    pub fn from_env() -> Self {
        let dir = env_opt("JOURNALPARSER_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_dir);
        let defaults = Self::in_dir(&dir);
        Self {
            executable: env_opt("JOURNALPARSER_EXE")
                .map(PathBuf::from)
                .unwrap_or(defaults.executable),
            config_file: env_opt("JOURNALPARSER_CONF")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_file),
            suppress_messages: env_bool("JOURNALPARSER_NOMESSAGE", true),
            quiet: env_bool("JOURNALPARSER_QUIET", true),
        }
    }
}

// ── Journal database ──────────────────────────────────────────

/// Connection settings for the MySQL database the parser writes to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_or("JOURNAL_DB_HOST", "localhost"),
            port: env_u16("JOURNAL_DB_PORT", 3306),
            username: env_or("JOURNAL_DB_USER", "journal"),
            password: env_or("JOURNAL_DB_PASSWORD", "$journal"),
            database: env_or("JOURNAL_DB_NAME", "journal"),
        }
    }
}

// ── Ingestion run ─────────────────────────────────────────────

/// What happens to the rest of a batch after one file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and carry on with the next file.
    #[default]
    BestEffort,
    /// Stop at the first failure.
    Strict,
}

/// How many times the parser is called per journal file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationMode {
    /// Once per file, selecting every run with `*`.
    #[default]
    Cycle,
    /// Once per run entry found in the file.
    PerRun,
}

/// Everything one ingestion run needs, resolved up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Instrument name, passed to the parser as the file prefix.
    pub instrument: String,
    /// Instrument control computer, e.g. `NDXENGINX`.
    pub hostname: String,
    pub data_dir: PathBuf,
    /// Explicit file list; `None` scans `data_dir`.
    pub files: Option<Vec<String>>,
    pub parser: ParserConfig,
    pub mode: InvocationMode,
    pub policy: FailurePolicy,
}

impl IngestConfig {
    /// Build a config, rejecting a missing instrument or host name before any
    /// side effect happens.
    pub fn new(
        instrument: Option<String>,
        hostname: Option<String>,
        data_dir: PathBuf,
        parser: ParserConfig,
    ) -> Result<Self> {
        let instrument = instrument
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| JournalError::Config("instrument name is required".to_string()))?;
        let hostname = hostname
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| JournalError::Config("instrument host name is required".to_string()))?;
        Ok(Self {
            instrument,
            hostname,
            data_dir,
            files: None,
            parser,
            mode: InvocationMode::default(),
            policy: FailurePolicy::default(),
        })
    }

    pub fn with_files(mut self, files: Option<Vec<String>>) -> Self {
        self.files = files;
        self
    }

    pub fn with_mode(mut self, mode: InvocationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Instrument name the parser matches `NXentry` names against: the host
    /// name without its three-letter `NDX`/`NDW` prefix. Hosts too short to
    /// carry one fall back to the instrument.
    pub fn run_prefix(&self) -> &str {
        match self.hostname.get(3..) {
            Some(rest) if !rest.is_empty() => rest,
            _ => &self.instrument,
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Ingest config:");
        tracing::info!("  instrument:  {} (host {})", self.instrument, self.hostname);
        tracing::info!("  data_dir:    {}", self.data_dir.display());
        tracing::info!("  parser:      {}", self.parser.executable.display());
        tracing::info!("  config_file: {}", self.parser.config_file.display());
        tracing::info!("  mode:        {:?}, policy: {:?}", self.mode, self.policy);
    }
}
