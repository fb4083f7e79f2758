use tracing::{info, warn};

use journal_core::IngestConfig;

use crate::batch::{run_batch, BatchReport};
use crate::discovery::discover;
use crate::error::IngestError;
use crate::guard::NotificationGuard;
use crate::invoker::ParserRunner;

/// Discover journals and run them through the parser with notifications
/// suppressed. The guard is released on every path out of the batch,
/// including a strict abort; a panic or a dropped future releases it via
/// `Drop`.
pub async fn ingest(
    config: &IngestConfig,
    runner: &dyn ParserRunner,
) -> Result<BatchReport, IngestError> {
    let files = discover(&config.data_dir, config.files.as_deref())?;
    if files.is_empty() {
        info!(dir = %config.data_dir.display(), "no journal files to ingest");
        return Ok(BatchReport::start().finish());
    }
    info!(count = files.len(), "journal files queued");

    let config_file = &config.parser.config_file;
    let guard = NotificationGuard::acquire(config_file).map_err(|source| IngestError::Guard {
        path: config_file.clone(),
        source,
    })?;

    let result = run_batch(&files, config, runner).await;

    let released = guard.release().map_err(|source| IngestError::Guard {
        path: config_file.clone(),
        source,
    });
    if let (Err(batch), Err(guard)) = (&result, &released) {
        warn!(error = %guard, batch_error = %batch, "notification config not restored");
    }
    let report = result?;
    released?;
    Ok(report)
}
