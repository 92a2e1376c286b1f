// src/results/sqlite.rs
// =============================================================================
// SQLite result repository (table `results`, see db.rs).
//
// author_id is NULL for guests. discovered_at is stored as Unix seconds.
// Rows with an unknown type, location or method label are read back with
// the closest neutral value rather than failing the whole listing.
// =============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{Author, FlaggedResult, NewResult, ResultRepository, ScanMethod};
use crate::checker::{Location, StatusType};
use crate::error::StoreError;

const COLUMNS: &str = "id, link, text, status_type, code, source_url, location, author_id, discovered_at, method";

#[derive(Debug, Clone)]
pub struct SqliteResults {
    pool: SqlitePool,
}

impl SqliteResults {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn from_row(row: &SqliteRow) -> FlaggedResult {
    let status_type: String = row.get("status_type");
    let code: i64 = row.get("code");
    let location: String = row.get("location");
    let author_id: Option<i64> = row.get("author_id");
    let discovered_at: i64 = row.get("discovered_at");
    let method: String = row.get("method");

    FlaggedResult {
        id: row.get("id"),
        link: row.get("link"),
        text: row.get("text"),
        status_type: StatusType::parse(&status_type).unwrap_or(StatusType::Broken),
        code: u16::try_from(code).unwrap_or_default(),
        source_url: row.get("source_url"),
        location: Location::parse(&location).unwrap_or(Location::Content),
        author: author_id
            .and_then(|id| u64::try_from(id).ok())
            .map(Author::from_id)
            .unwrap_or(Author::Guest),
        discovered_at: DateTime::from_timestamp(discovered_at, 0).unwrap_or_default(),
        method: ScanMethod::parse(&method).unwrap_or(ScanMethod::Visit),
    }
}

#[async_trait]
impl ResultRepository for SqliteResults {
    async fn find_by_link(&self, link: &str) -> Result<Option<FlaggedResult>, StoreError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM results WHERE link = ? ORDER BY id LIMIT 1"))
            .bind(link)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(from_row))
    }

    async fn get(&self, id: i64) -> Result<Option<FlaggedResult>, StoreError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM results WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(from_row))
    }

    async fn insert(&self, result: NewResult) -> Result<i64, StoreError> {
        let author_id = result.author.id().and_then(|id| i64::try_from(id).ok());
        let row = sqlx::query(
            "INSERT INTO results (link, text, status_type, code, source_url, location, author_id, discovered_at, method)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&result.status.link)
        .bind(&result.status.text)
        .bind(result.status.status_type.as_str())
        .bind(i64::from(result.status.code))
        .bind(&result.source_url)
        .bind(result.location.as_str())
        .bind(author_id)
        .bind(Utc::now().timestamp())
        .bind(result.method.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("id"))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM results WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_source(&self, source_url: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM results WHERE source_url = ?")
            .bind(source_url)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list(&self) -> Result<Vec<FlaggedResult>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM results ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(from_row).collect())
    }
}
