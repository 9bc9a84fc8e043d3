//! SQLite connection pool with WAL mode.
//!
//! All service state lives in SQLite behind this pool; the process itself
//! holds no shared mutable state. WAL mode keeps reads concurrent with the
//! transactional writes the storage layer issues.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<Sqlite>;

/// Create a new connection pool with WAL mode enabled.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
///
/// # Returns
/// A connection pool ready for use
pub async fn create_pool(db_path: &Path) -> Result<DbPool, sqlx::Error> {
    let db_url = format!("sqlite:{}", db_path.display());

    let connect_options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        // WAL keeps readers unblocked while a write transaction is in flight
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        // reviewer/author references depend on enforced foreign keys
        .foreign_keys(true)
        // concurrent write transactions wait instead of failing immediately
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect_with(connect_options)
        .await?;

    let mode: (String,) = sqlx::query_as("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await?;

    debug_assert!(
        mode.0.to_lowercase() == "wal",
        "WAL mode should be enabled, got: {}",
        mode.0
    );

    Ok(pool)
}
