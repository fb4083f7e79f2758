//! Read-side access to the `journal_entries` table.
//!
//! The parser owns every write to the journal database. This module only
//! counts and cleans up rows so the parser's contract can be checked against
//! a live server.

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use thiserror::Error;
use tracing::debug;

use journal_core::DatabaseConfig;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

pub struct JournalDb {
    pool: MySqlPool,
}

impl JournalDb {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database);
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        debug!(host = %config.host, db = %config.database, "connected to journal database");
        Ok(Self { pool })
    }

    /// Number of `journal_entries` rows carrying `run_number`.
    pub async fn count_run_entries(&self, run_number: u32) -> Result<i64, DbError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM journal_entries WHERE run_number = ?")
                .bind(run_number)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Remove every row written for `instrument`; returns rows deleted.
    pub async fn delete_instrument_entries(&self, instrument: &str) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM journal_entries WHERE instrument_name = ?")
            .bind(instrument)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
