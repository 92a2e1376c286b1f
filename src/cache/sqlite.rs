// src/cache/sqlite.rs
// =============================================================================
// SQLite cache repository (table `link_cache`, see db.rs).
//
// Timestamps are stored as Unix seconds. Rows are upserted on `link_key`
// and read back by the full link, so a key collision reads as a miss for
// the link that lost the row.
// =============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use super::{cache_key, CacheEntry, CacheRepository};
use crate::checker::StatusType;
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheRepository for SqliteCache {
    async fn get(&self, link: &str, not_before: DateTime<Utc>) -> Result<Option<CacheEntry>, StoreError> {
        let row = sqlx::query(
            "SELECT link, http_code, status_type, status_text, last_checked
             FROM link_cache
             WHERE link_key = ? AND link = ? AND last_checked >= ?",
        )
        .bind(cache_key(link))
        .bind(link)
        .bind(not_before.timestamp())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let code: i64 = row.get("http_code");
        let status_type: String = row.get("status_type");
        let checked: i64 = row.get("last_checked");

        Ok(Some(CacheEntry {
            link: row.get("link"),
            http_code: u16::try_from(code).unwrap_or_default(),
            status_type: StatusType::parse(&status_type).unwrap_or(StatusType::Good),
            status_text: row.get("status_text"),
            last_checked: DateTime::from_timestamp(checked, 0).unwrap_or_default(),
        }))
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO link_cache (link_key, link, http_code, status_type, status_text, last_checked)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(link_key) DO UPDATE SET
                link = excluded.link,
                http_code = excluded.http_code,
                status_type = excluded.status_type,
                status_text = excluded.status_text,
                last_checked = excluded.last_checked",
        )
        .bind(cache_key(&entry.link))
        .bind(&entry.link)
        .bind(i64::from(entry.http_code))
        .bind(entry.status_type.as_str())
        .bind(&entry.status_text)
        .bind(entry.last_checked.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM link_cache WHERE last_checked < ?")
            .bind(cutoff.timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn destroy(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM link_cache").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::checker::StatusRecord;
    use crate::db::memory_pool;
    use chrono::Duration;
    use std::sync::Arc;

    fn entry(link: &str, age_seconds: i64) -> CacheEntry {
        CacheEntry {
            link: link.to_string(),
            http_code: 200,
            status_type: StatusType::Good,
            status_text: "OK".to_string(),
            last_checked: Utc::now() - Duration::seconds(age_seconds),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let repo = SqliteCache::new(memory_pool().await.unwrap());
        repo.upsert(entry("https://a.example/", 0)).await.unwrap();

        let found = repo
            .get("https://a.example/", Utc::now() - Duration::seconds(10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.link, "https://a.example/");
        assert_eq!(found.http_code, 200);
        assert_eq!(found.status_type, StatusType::Good);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_key() {
        let pool = memory_pool().await.unwrap();
        let repo = SqliteCache::new(pool.clone());
        repo.upsert(entry("https://a.example/", 500)).await.unwrap();
        repo.upsert(entry("https://a.example/", 0)).await.unwrap();

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM link_cache")
            .fetch_one(&pool)
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 1);
        assert!(repo
            .get("https://a.example/", Utc::now() - Duration::seconds(10))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_purge_older_than() {
        let repo = SqliteCache::new(memory_pool().await.unwrap());
        repo.upsert(entry("https://old.example/", 3600)).await.unwrap();
        repo.upsert(entry("https://new.example/", 0)).await.unwrap();

        let removed = repo
            .purge_older_than(Utc::now() - Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_store_over_sqlite_skips_broken() {
        let repo = Arc::new(SqliteCache::new(memory_pool().await.unwrap()));
        let cache = CacheStore::new(repo, 300);
        cache
            .put(&StatusRecord::new(StatusType::Broken, 404, "Not Found", "https://gone.example/"))
            .await;
        cache
            .put(&StatusRecord::new(StatusType::Good, 200, "OK", "https://ok.example/"))
            .await;

        assert!(cache.get("https://gone.example/").await.is_none());
        assert_eq!(cache.get("https://ok.example/").await.unwrap().code, 200);
    }
}
