//! Database connection management.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

/// Read-only connection to a SQLite copy of the legacy site database.
#[derive(Debug, Clone)]
pub struct LegacyDb {
    pool: SqlitePool,
}

impl LegacyDb {
    /// Open an existing legacy database. The file is never written.
    pub async fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DbError::not_found("legacy database", path.display().to_string()));
        }

        info!("Opening legacy database: {}", path.display());
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        debug!("Legacy database connection established");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (fixtures build their own legacy schema).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Connection to the target database holding migrated forms.
#[derive(Debug, Clone)]
pub struct TargetDb {
    pool: SqlitePool,
}

impl TargetDb {
    /// Open or create the target database and run pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening target database: {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .pragma("cache_size", "-64000") // 64MB cache
            .pragma("synchronous", "NORMAL") // Safe with WAL
            .pragma("temp_store", "MEMORY")
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        debug!("Target database connection established");

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Open an in-memory database (for testing).
    pub async fn open_in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .journal_mode(SqliteJournalMode::Wal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(1) // In-memory must be single connection to share state
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
        debug!("Running target database migrations");
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Target database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Check if the database is healthy.
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn stats(&self) -> DbResult<TargetStats> {
        let forms: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM webforms")
            .fetch_one(&self.pool)
            .await?;

        let submissions: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM webform_submissions")
            .fetch_one(&self.pool)
            .await?;

        Ok(TargetStats {
            form_count: forms.0 as u64,
            submission_count: submissions.0 as u64,
        })
    }
}

/// Target database statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetStats {
    pub form_count: u64,
    pub submission_count: u64,
}
