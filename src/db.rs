// src/db.rs
// =============================================================================
// SQLite pool setup and schema.
//
// One database file holds the three persistent tables:
// - link_cache:  last known good status per link (TTL-bound)
// - results:     flagged links with their source page
// - omits:       omissions added from the command line
//
// The schema is created idempotently on every start; there is no migration
// history to replay.
// =============================================================================

use std::path::Path;
use std::str::FromStr;

use log::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::StoreError;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS link_cache (
        link_key TEXT NOT NULL UNIQUE,
        link TEXT NOT NULL,
        http_code INTEGER NOT NULL,
        status_type TEXT NOT NULL,
        status_text TEXT NOT NULL,
        last_checked INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_link_cache_last_checked ON link_cache (last_checked)",
    "CREATE TABLE IF NOT EXISTS results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        link TEXT NOT NULL,
        text TEXT NOT NULL,
        status_type TEXT NOT NULL,
        code INTEGER NOT NULL,
        source_url TEXT NOT NULL,
        location TEXT NOT NULL,
        author_id INTEGER,
        discovered_at INTEGER NOT NULL,
        method TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_results_link ON results (link)",
    "CREATE INDEX IF NOT EXISTS idx_results_source ON results (source_url)",
    "CREATE TABLE IF NOT EXISTS omits (
        kind TEXT NOT NULL,
        value TEXT NOT NULL,
        UNIQUE (kind, value)
    )",
];

/// Opens (creating if needed) the database file and applies the schema.
pub async fn init_pool(path: &Path) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    info!("Opened database {}", path.display());
    Ok(pool)
}

/// A private in-memory database. A single connection keeps every query on
/// the same database.
pub async fn memory_pool() -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!("Schema ready ({} statements)", SCHEMA.len());
    Ok(())
}
