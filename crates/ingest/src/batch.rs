//! Batch ingestion as a fold over journal files.
//!
//! Each file yields a [`FileOutcome`]; expected failures (bad names,
//! malformed XML, parser errors) are values in the report, not errors. Only
//! the strict policy turns the first failed file into [`IngestError::Aborted`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use journal_core::{FailurePolicy, IngestConfig, InvocationMode, JournalFile, RunSelector};

use crate::error::{IngestError, InvokeError};
use crate::inspect::inspect_file;
use crate::invoker::{ParserInvocation, ParserRunner};

/// What happened to one journal file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// Every invocation for the file succeeded.
    Ingested { invocations: usize },
    InvalidName { reason: String },
    Malformed { reason: String },
    /// Per-run mode found no entries for the instrument.
    NoRuns,
    /// The parser exited non-zero; `succeeded` runs went through before it.
    ParserFailed {
        selector: String,
        exit_code: Option<i32>,
        succeeded: usize,
    },
    LaunchFailed { reason: String },
}

impl FileStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, FileStatus::Ingested { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub file: String,
    pub cycle: Option<String>,
    #[serde(flatten)]
    pub status: FileStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            outcomes: Vec::new(),
        }
    }

    fn push(mut self, outcome: FileOutcome) -> Self {
        self.outcomes.push(outcome);
        self
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_success())
    }

    pub fn elapsed_secs(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} journal file(s): {} ingested, {} failed ({:.1}s)",
            self.outcomes.len(),
            self.succeeded(),
            self.failed(),
            self.elapsed_secs()
        )?;
        for o in self.failures() {
            let detail = match &o.status {
                FileStatus::InvalidName { reason } => format!("invalid name: {reason}"),
                FileStatus::Malformed { reason } => format!("malformed data: {reason}"),
                FileStatus::NoRuns => "no runs for instrument".to_string(),
                FileStatus::ParserFailed {
                    selector,
                    exit_code,
                    succeeded,
                } => format!(
                    "parser failed on {selector} (exit {}) after {succeeded} run(s)",
                    exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string())
                ),
                FileStatus::LaunchFailed { reason } => format!("could not launch parser: {reason}"),
                FileStatus::Ingested { .. } => continue,
            };
            writeln!(f, "  {}: {detail}", o.file)?;
        }
        Ok(())
    }
}

/// Ingest `files` one after another.
pub async fn run_batch(
    files: &[String],
    config: &IngestConfig,
    runner: &dyn ParserRunner,
) -> Result<BatchReport, IngestError> {
    let mut report = BatchReport::start();
    for name in files {
        let outcome = process_file(name, config, runner).await;
        let failed = !outcome.status.is_success();
        report = report.push(outcome);
        if failed && config.policy == FailurePolicy::Strict {
            return Err(IngestError::Aborted {
                file: name.clone(),
                report: report.finish(),
            });
        }
    }
    Ok(report.finish())
}

/// Validate, inspect and hand one file to the parser.
pub async fn process_file(
    name: &str,
    config: &IngestConfig,
    runner: &dyn ParserRunner,
) -> FileOutcome {
    info!(file = name, dir = %config.data_dir.display(), "parsing journal");

    let file = match JournalFile::resolve(&config.data_dir, name) {
        Ok(f) => f,
        Err(e) => {
            warn!(file = name, error = %e, "skipping journal with unexpected name");
            return outcome(name, None, FileStatus::InvalidName { reason: e.to_string() });
        }
    };
    let cycle = Some(file.year_cycle.clone());

    let summary = match inspect_file(&file.path) {
        Ok(s) => s,
        Err(e) => {
            warn!(file = name, error = %e, "malformed journal data");
            return outcome(name, cycle, FileStatus::Malformed { reason: e.to_string() });
        }
    };

    let selectors = match config.mode {
        InvocationMode::Cycle => vec![RunSelector::All],
        InvocationMode::PerRun => match summary.run_numbers(config.run_prefix()) {
            Ok(runs) if runs.is_empty() => {
                warn!(file = name, instrument = config.run_prefix(), "no runs for instrument");
                return outcome(name, cycle, FileStatus::NoRuns);
            }
            Ok(runs) => runs.into_iter().map(RunSelector::Run).collect(),
            Err(e) => {
                warn!(file = name, error = %e, "malformed journal data");
                return outcome(name, cycle, FileStatus::Malformed { reason: e.to_string() });
            }
        },
    };

    let mut succeeded = 0;
    for selector in selectors {
        let invocation =
            ParserInvocation::for_file(&config.instrument, &config.hostname, &file, selector);
        match runner.run(&invocation).await {
            Ok(()) => succeeded += 1,
            Err(InvokeError::NonZeroExit { code }) => {
                warn!(file = name, selector = %selector, exit_code = ?code, "couldn't load data");
                let status = FileStatus::ParserFailed {
                    selector: selector.to_string(),
                    exit_code: code,
                    succeeded,
                };
                return outcome(name, cycle, status);
            }
            Err(e @ InvokeError::Launch { .. }) => {
                warn!(file = name, error = %e, "couldn't load data");
                return outcome(name, cycle, FileStatus::LaunchFailed { reason: e.to_string() });
            }
        }
    }

    info!(file = name, invocations = succeeded, "journal ingested");
    outcome(name, cycle, FileStatus::Ingested { invocations: succeeded })
}

fn outcome(file: &str, cycle: Option<String>, status: FileStatus) -> FileOutcome {
    FileOutcome {
        file: file.to_string(),
        cycle,
        status,
    }
}
