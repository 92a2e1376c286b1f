// src/results/memory.rs
// In-process result repository, used by tests and one-shot runs.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{FlaggedResult, NewResult, ResultRepository};
use crate::error::StoreError;

#[derive(Debug, Default)]
pub struct MemoryResults {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    rows: Vec<FlaggedResult>,
}

impl MemoryResults {
    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned("results"))
    }
}

#[async_trait]
impl ResultRepository for MemoryResults {
    async fn find_by_link(&self, link: &str) -> Result<Option<FlaggedResult>, StoreError> {
        Ok(self.lock()?.rows.iter().find(|r| r.link == link).cloned())
    }

    async fn get(&self, id: i64) -> Result<Option<FlaggedResult>, StoreError> {
        Ok(self.lock()?.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn insert(&self, result: NewResult) -> Result<i64, StoreError> {
        let mut inner = self.lock()?;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.rows.push(FlaggedResult {
            id,
            link: result.status.link,
            text: result.status.text,
            status_type: result.status.status_type,
            code: result.status.code,
            source_url: result.source_url,
            location: result.location,
            author: result.author,
            discovered_at: Utc::now(),
            method: result.method,
        });
        Ok(id)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.rows.len();
        inner.rows.retain(|r| r.id != id);
        Ok(inner.rows.len() < before)
    }

    async fn delete_by_source(&self, source_url: &str) -> Result<u64, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.rows.len();
        inner.rows.retain(|r| r.source_url != source_url);
        Ok((before - inner.rows.len()) as u64)
    }

    async fn list(&self) -> Result<Vec<FlaggedResult>, StoreError> {
        Ok(self.lock()?.rows.clone())
    }
}
