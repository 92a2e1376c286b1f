// src/omit_store.rs
// Omissions added with `link-notifier omit ...`, kept in the `omits` table and
// merged with the ones from the configuration file at startup.

use log::debug;
use sqlx::{Row, SqlitePool};

use crate::checker::{OmitKind, Omissions};
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct OmitStore {
    pool: SqlitePool,
}

impl OmitStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records an omission. Returns false when it was already recorded.
    pub async fn add(&self, kind: OmitKind, value: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("INSERT OR IGNORE INTO omits (kind, value) VALUES (?, ?)")
            .bind(kind.as_str())
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(&self) -> Result<Vec<(OmitKind, String)>, StoreError> {
        let rows = sqlx::query("SELECT kind, value FROM omits ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let kind: String = row.get("kind");
                let kind = match kind.as_str() {
                    "link" => OmitKind::Link,
                    "page" => OmitKind::Page,
                    _ => return None,
                };
                Some((kind, row.get("value")))
            })
            .collect())
    }

    /// Adds every stored omission to `base`.
    pub async fn merge_into(&self, mut base: Omissions) -> Result<Omissions, StoreError> {
        let stored = self.list().await?;
        debug!("Loaded {} stored omission(s)", stored.len());
        for (kind, value) in stored {
            base.add(kind, value);
        }
        Ok(base)
    }
}
