//! Invocation of the external `JournalParser` executable.
//!
//! The parser takes five positional arguments:
//! `<file_prefix> <run|*> cycle_<yy>_<n> <journal_dir> <computer_name>`
//! and signals success only through its exit status.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use journal_core::{JournalFile, ParserConfig, RunSelector};

use crate::error::InvokeError;

/// Set on the child so the parser skips its notification side channel.
pub const NOMESSAGE_ENV: &str = "JOURNALPARSER_NOMESSAGE";

/// One call to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserInvocation {
    pub instrument: String,
    pub selector: RunSelector,
    /// Full `cycle_<yy>_<n>` argument.
    pub cycle: String,
    pub data_dir: PathBuf,
    pub hostname: String,
}

impl ParserInvocation {
    /// The parser is pointed at the directory `file` lives in, since it only
    /// ever loads `<dir>/journal_<cycle>.xml`.
    pub fn for_file(
        instrument: &str,
        hostname: &str,
        file: &JournalFile,
        selector: RunSelector,
    ) -> Self {
        Self {
            instrument: instrument.to_string(),
            selector,
            cycle: file.cycle_arg(),
            data_dir: file.dir().to_path_buf(),
            hostname: hostname.to_string(),
        }
    }

    /// Positional arguments in the order the parser reads them.
    pub fn args(&self) -> [String; 5] {
        [
            self.instrument.clone(),
            self.selector.to_string(),
            self.cycle.clone(),
            self.data_dir.display().to_string(),
            self.hostname.clone(),
        ]
    }
}

impl fmt::Display for ParserInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} \"{}\" {}",
            self.instrument,
            self.selector,
            self.cycle,
            self.data_dir.display(),
            self.hostname
        )
    }
}

/// Runs parser invocations. The process-backed implementation is
/// [`ProcessRunner`]; tests substitute their own.
#[async_trait]
pub trait ParserRunner: Send + Sync {
    async fn run(&self, invocation: &ParserInvocation) -> Result<(), InvokeError>;
}

/// Spawns the parser executable and waits for it.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    suppress_messages: bool,
    quiet: bool,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            suppress_messages: true,
            quiet: true,
        }
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        Self {
            program: config.executable.clone(),
            suppress_messages: config.suppress_messages,
            quiet: config.quiet,
        }
    }

    pub fn with_suppress_messages(mut self, suppress: bool) -> Self {
        self.suppress_messages = suppress;
        self
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd.stdout(if self.quiet {
            Stdio::null()
        } else {
            Stdio::inherit()
        });
        if self.suppress_messages {
            cmd.env(NOMESSAGE_ENV, "1");
        } else {
            cmd.env_remove(NOMESSAGE_ENV);
        }
        cmd
    }

    /// Run the parser with arbitrary arguments and map its exit status.
    pub async fn run_raw(&self, args: &[String]) -> Result<(), InvokeError> {
        debug!(program = %self.program.display(), ?args, "launching parser");
        let status = self
            .command(args)
            .status()
            .await
            .map_err(|source| InvokeError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            debug!(exit_code = ?status.code(), "parser returned non-zero exit code");
            Err(InvokeError::NonZeroExit {
                code: status.code(),
            })
        }
    }
}

#[async_trait]
impl ParserRunner for ProcessRunner {
    async fn run(&self, invocation: &ParserInvocation) -> Result<(), InvokeError> {
        self.run_raw(&invocation.args()).await
    }
}
