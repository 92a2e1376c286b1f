// src/cache/memory.rs
// In-process cache repository. Lost on exit; used for one-off checks and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{cache_key, CacheEntry, CacheRepository};
use crate::error::StoreError;

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CacheEntry>>, StoreError> {
        self.entries.lock().map_err(|_| StoreError::Poisoned("cache"))
    }
}

#[async_trait]
impl CacheRepository for MemoryCache {
    async fn get(&self, link: &str, not_before: DateTime<Utc>) -> Result<Option<CacheEntry>, StoreError> {
        let entries = self.lock()?;
        Ok(entries
            .get(&cache_key(link))
            .filter(|entry| entry.link == link && entry.last_checked >= not_before)
            .cloned())
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), StoreError> {
        self.lock()?.insert(cache_key(&entry.link), entry);
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, entry| entry.last_checked >= cutoff);
        Ok((before - entries.len()) as u64)
    }

    async fn destroy(&self) -> Result<(), StoreError> {
        self.lock()?.clear();
        Ok(())
    }
}
