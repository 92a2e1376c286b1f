// src/cache/mod.rs
// =============================================================================
// The link cache: remembers links that recently checked good so a page load
// does not re-check every link every time.
//
// Rules:
// - Only good statuses are stored. Broken and warning links are re-checked
//   live every time, they are what the tool exists to report.
// - A TTL of 0 disables the cache: nothing is read or written.
// - Entries older than the TTL are misses, and purge_expired() deletes them.
// - Rows are unique on the first CACHE_KEY_LENGTH characters of the link.
//   Two long links that only differ after that prefix share one row, the
//   last writer wins.
//
// Storage sits behind the CacheRepository trait with an in-memory and a
// SQLite implementation.
// =============================================================================

mod memory;
mod sqlite;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

use crate::checker::{StatusRecord, StatusType};
use crate::config::CACHE_KEY_LENGTH;
use crate::error::StoreError;

/// One stored classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub link: String,
    pub http_code: u16,
    pub status_type: StatusType,
    pub status_text: String,
    pub last_checked: DateTime<Utc>,
}

impl CacheEntry {
    pub fn into_status(self) -> StatusRecord {
        StatusRecord::new(self.status_type, self.http_code, self.status_text, self.link)
    }
}

/// The uniqueness key of a link: its first CACHE_KEY_LENGTH characters.
pub fn cache_key(link: &str) -> String {
    link.chars().take(CACHE_KEY_LENGTH).collect()
}

#[async_trait]
pub trait CacheRepository: Send + Sync {
    /// The entry for exactly `link`, if it was checked at or after `not_before`.
    async fn get(&self, link: &str, not_before: DateTime<Utc>) -> Result<Option<CacheEntry>, StoreError>;
    /// Inserts or overwrites the row sharing the entry's key.
    async fn upsert(&self, entry: CacheEntry) -> Result<(), StoreError>;
    /// Deletes entries checked before `cutoff`; returns how many were removed.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
    /// Deletes every entry.
    async fn destroy(&self) -> Result<(), StoreError>;
}

/// TTL policy on top of a repository.
#[derive(Clone)]
pub struct CacheStore {
    repo: Arc<dyn CacheRepository>,
    ttl_seconds: u64,
}

impl CacheStore {
    pub fn new(repo: Arc<dyn CacheRepository>, ttl_seconds: u64) -> Self {
        Self { repo, ttl_seconds }
    }

    /// An in-memory store, handy for one-off checks and tests.
    pub fn in_memory(ttl_seconds: u64) -> Self {
        Self::new(Arc::new(MemoryCache::default()), ttl_seconds)
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl_seconds > 0
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let ttl = i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX);
        now.checked_sub_signed(Duration::seconds(ttl.min(i64::MAX / 1000)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    // Looks up a fresh cached status for a link.
    //
    // Returns None when the cache is disabled, the link was never stored, the
    // entry is older than the TTL, or the store failed (a failing cache only
    // costs a live check).
    pub async fn get(&self, link: &str) -> Option<StatusRecord> {
        if !self.is_enabled() {
            return None;
        }

        match self.repo.get(link, self.cutoff(Utc::now())).await {
            Ok(Some(entry)) => {
                debug!("Cache hit for {}", link);
                Some(entry.into_status())
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Cache lookup failed for {}: {}", link, e);
                None
            }
        }
    }

    // Stores a good status. Anything else, or a disabled cache, is a no-op.
    pub async fn put(&self, status: &StatusRecord) {
        if !self.is_enabled() || !status.is_good() {
            return;
        }

        let entry = CacheEntry {
            link: status.link.clone(),
            http_code: status.code,
            status_type: status.status_type,
            status_text: status.text.clone(),
            last_checked: Utc::now(),
        };

        if let Err(e) = self.repo.upsert(entry).await {
            warn!("Cache write failed for {}: {}", status.link, e);
        }
    }

    /// Deletes entries older than the TTL. A disabled cache has nothing to keep.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        if !self.is_enabled() {
            self.repo.destroy().await?;
            return Ok(0);
        }
        let removed = self.repo.purge_older_than(self.cutoff(Utc::now())).await?;
        debug!("Purged {} expired cache entries", removed);
        Ok(removed)
    }

    pub async fn destroy(&self) -> Result<(), StoreError> {
        self.repo.destroy().await
    }
}
