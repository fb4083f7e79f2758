mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use journal_core::config::{install_dir, load_dotenv};
use journal_core::{FailurePolicy, IngestConfig, InvocationMode, ParserConfig};
use journal_ingest::{ingest, BatchReport, IngestError, ProcessRunner};

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    let mut parser = ParserConfig::from_env();
    if let Some(exe) = args.parser.clone() {
        parser.executable = exe;
    }
    if args.show_parser_output {
        parser.quiet = false;
    }

    let data_dir = args.dir.clone().unwrap_or_else(install_dir);
    let config = IngestConfig::new(args.instrument.clone(), args.hostname.clone(), data_dir, parser)
        .context("invalid ingestion settings")?
        .with_files(args.files.clone())
        .with_mode(if args.per_run {
            InvocationMode::PerRun
        } else {
            InvocationMode::Cycle
        })
        .with_policy(if args.strict {
            FailurePolicy::Strict
        } else {
            FailurePolicy::BestEffort
        });
    config.log_summary();

    let runner = ProcessRunner::from_config(&config.parser);

    // Dropping the ingest future on Ctrl-C kills the running parser and
    // releases the notification guard before we exit.
    let result = tokio::select! {
        result = ingest(&config, &runner) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, stopping parser");
            bail!("ingestion interrupted");
        }
    };

    match result {
        Ok(report) => {
            print_report(&report, args.json)?;
            if !report.is_clean() {
                warn!(failed = report.failed(), "some journal files were not loaded");
            }
            info!("ingestion finished");
            Ok(())
        }
        Err(IngestError::Aborted { file, report }) => {
            print_report(&report, args.json)?;
            bail!("ingestion stopped at {file}")
        }
        Err(e) => Err(e).context("ingestion failed"),
    }
}

fn print_report(report: &BatchReport, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(report).context("failed to serialize report")?;
        println!("{text}");
    } else {
        print!("{report}");
    }
    Ok(())
}
