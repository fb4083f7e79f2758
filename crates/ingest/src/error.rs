use std::path::PathBuf;

use thiserror::Error;

use crate::batch::BatchReport;

/// Failure of a single parser invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parser exited with {}", exit_label(.code))]
    NonZeroExit { code: Option<i32> },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Errors that stop an ingestion run as a whole.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot read data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notification config {path}: {source}")]
    Guard {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Strict policy hit a failing file; the report covers everything up to it.
    #[error("ingestion aborted at {file}")]
    Aborted { file: String, report: BatchReport },
}
