// src/results/mod.rs
// =============================================================================
// Flagged results: the broken and warning links found on the site, each tied
// to the page it was found on.
//
// Lifecycle of a record:
//   absent -> flagged            a check came back broken/warning (dedup by link)
//   flagged -> removed           a re-check came back good or omitted
//   flagged -> cleared           deleted by hand, no re-check
//   flagged -> replaced          the source page was rewritten to a new link
//   flagged -> updated           a re-check is still flagged but with another
//                                code or type: delete and add again
// Deletion is permanent. A link that breaks again later gets a new record.
// =============================================================================

mod memory;
mod source;
mod sqlite;

pub use memory::MemoryResults;
pub use source::{DirectorySource, MemorySource, SourceContent, UnmanagedSource};
pub use sqlite::SqliteResults;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use serde::Serialize;
use url::Url;

use crate::checker::{LinkClassifier, Location, StatusRecord, StatusType};
use crate::config::SiteConfig;
use crate::error::StoreError;

/// Who was browsing when a link was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User(u64),
    Guest,
}

impl Author {
    /// 0 is the anonymous visitor.
    pub fn from_id(id: u64) -> Self {
        if id == 0 {
            Author::Guest
        } else {
            Author::User(id)
        }
    }

    pub fn id(&self) -> Option<u64> {
        match self {
            Author::User(id) => Some(*id),
            Author::Guest => None,
        }
    }
}

/// How a link came to be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMethod {
    /// Observed during an ordinary page load
    Visit,
    SingleScan,
    MultiScan,
}

impl ScanMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMethod::Visit => "visit",
            ScanMethod::SingleScan => "single-scan",
            ScanMethod::MultiScan => "multi-scan",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "visit" => Some(ScanMethod::Visit),
            "single-scan" => Some(ScanMethod::SingleScan),
            "multi-scan" => Some(ScanMethod::MultiScan),
            _ => None,
        }
    }
}

/// A stored result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlaggedResult {
    pub id: i64,
    pub link: String,
    pub text: String,
    #[serde(rename = "type")]
    pub status_type: StatusType,
    pub code: u16,
    pub source_url: String,
    pub location: Location,
    pub author: Author,
    pub discovered_at: DateTime<Utc>,
    pub method: ScanMethod,
}

impl FlaggedResult {
    pub fn status(&self) -> StatusRecord {
        StatusRecord::new(self.status_type, self.code, self.text.clone(), self.link.clone())
    }
}

/// A result about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResult {
    pub status: StatusRecord,
    pub source_url: String,
    pub location: Location,
    pub author: Author,
    pub method: ScanMethod,
}

#[async_trait]
pub trait ResultRepository: Send + Sync {
    async fn find_by_link(&self, link: &str) -> Result<Option<FlaggedResult>, StoreError>;
    async fn get(&self, id: i64) -> Result<Option<FlaggedResult>, StoreError>;
    /// Stores the result and returns its new id.
    async fn insert(&self, result: NewResult) -> Result<i64, StoreError>;
    /// Returns whether a record was deleted.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
    async fn delete_by_source(&self, source_url: &str) -> Result<u64, StoreError>;
    /// All results, oldest first.
    async fn list(&self) -> Result<Vec<FlaggedResult>, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added(i64),
    AlreadyAdded,
    InvalidSource,
}

/// What a re-verification did to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReverifyOutcome {
    /// The record was deleted; the status says why
    Removed(StatusRecord),
    /// Still flagged with a new code or type, stored under a new id
    Updated { new_id: i64, status: StatusRecord },
    /// Still flagged the same way
    Unchanged(StatusRecord),
    NotFound,
}

pub struct ResultManager {
    repo: Arc<dyn ResultRepository>,
    config: Arc<SiteConfig>,
}

impl ResultManager {
    pub fn new(repo: Arc<dyn ResultRepository>, config: Arc<SiteConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn list(&self) -> Result<Vec<FlaggedResult>, StoreError> {
        self.repo.list().await
    }

    pub async fn get(&self, id: i64) -> Result<Option<FlaggedResult>, StoreError> {
        self.repo.get(id).await
    }

    /// Whether a record already exists for this exact link.
    pub async fn is_flagged(&self, link: &str) -> Result<bool, StoreError> {
        Ok(self.repo.find_by_link(link).await?.is_some())
    }

    // Stores a result unless the link is already recorded.
    //
    // The source URL loses the configured tracking query parameters and
    // must be an absolute http(s) URL.
    pub async fn add(&self, mut result: NewResult) -> Result<AddOutcome, StoreError> {
        if self.is_flagged(&result.status.link).await? {
            debug!("{} already recorded", result.status.link);
            return Ok(AddOutcome::AlreadyAdded);
        }

        let Some(source_url) = clean_source_url(&result.source_url, &self.config.source_query_strings_to_remove)
        else {
            debug!("Invalid source '{}' for {}", result.source_url, result.status.link);
            return Ok(AddOutcome::InvalidSource);
        };
        result.source_url = source_url;

        let id = self.repo.insert(result).await?;
        Ok(AddOutcome::Added(id))
    }

    /// Deletes the record of a link.
    pub async fn remove(&self, link: &str) -> Result<bool, StoreError> {
        match self.repo.find_by_link(link).await? {
            Some(found) => self.repo.delete(found.id).await,
            None => Ok(false),
        }
    }

    /// Deletes a record by id, without re-checking it.
    pub async fn clear(&self, id: i64) -> Result<bool, StoreError> {
        self.repo.delete(id).await
    }

    // Re-checks one record and updates the store to match.
    //
    // - source page gone or omitted -> deleted, status n/a
    // - link now good, omitted or n/a -> deleted
    // - still flagged, different code or type -> replaced by a fresh record
    // - otherwise untouched
    pub async fn reverify(
        &self,
        id: i64,
        classifier: &LinkClassifier,
        sources: &dyn SourceContent,
    ) -> Result<ReverifyOutcome> {
        let Some(record) = self.repo.get(id).await? else {
            return Ok(ReverifyOutcome::NotFound);
        };

        let source_gone = !sources.exists(&record.source_url);
        if source_gone || classifier.omissions().is_page_omitted(&record.source_url) {
            self.repo.delete(id).await?;
            let text = if source_gone {
                "Source no longer exists."
            } else {
                "Source page is omitted."
            };
            let status = StatusRecord::new(StatusType::NotApplicable, record.code, text, record.link);
            return Ok(ReverifyOutcome::Removed(status));
        }

        let status = classifier.check_link(&record.link).await;

        if !status.status_type.is_flagged() {
            self.repo.delete(id).await?;
            info!("{} is now {}, removed", record.link, status.status_type);
            return Ok(ReverifyOutcome::Removed(status));
        }

        if status.code != record.code || status.status_type != record.status_type {
            self.repo.delete(id).await?;
            let new_id = self
                .repo
                .insert(NewResult {
                    status: status.clone(),
                    source_url: record.source_url,
                    location: record.location,
                    author: record.author,
                    method: record.method,
                })
                .await?;
            info!("{} changed to {} {}", record.link, status.code, status.status_type);
            return Ok(ReverifyOutcome::Updated { new_id, status });
        }

        Ok(ReverifyOutcome::Unchanged(status))
    }

    /// Re-checks every record. Failures on one record are logged and skipped.
    pub async fn reverify_all(
        &self,
        classifier: &LinkClassifier,
        sources: &dyn SourceContent,
    ) -> Result<Vec<(i64, ReverifyOutcome)>> {
        let mut outcomes = Vec::new();
        for record in self.repo.list().await? {
            match self.reverify(record.id, classifier, sources).await {
                Ok(outcome) => outcomes.push((record.id, outcome)),
                Err(e) => error!("Re-verifying result #{} failed: {:#}", record.id, e),
            }
        }
        Ok(outcomes)
    }

    // Rewrites the source page so the flagged link points at `new_link`,
    // then deletes the record.
    pub async fn replace(&self, id: i64, new_link: &str, sources: &dyn SourceContent) -> Result<()> {
        let record = self
            .repo
            .get(id)
            .await?
            .with_context(|| format!("No result with id {id}"))?;

        if new_link.is_empty() {
            bail!("Replacement link is empty");
        }

        let content = sources
            .read(&record.source_url)
            .with_context(|| format!("Reading source {}", record.source_url))?;
        let updated = content.replace(&record.link, new_link);
        sources
            .write(&record.source_url, &updated)
            .with_context(|| format!("Writing source {}", record.source_url))?;

        self.repo.delete(id).await?;
        info!("Replaced {} with {} on {}", record.link, new_link, record.source_url);
        Ok(())
    }

    // Deletes every result found on a source page, then the page itself.
    //
    // Returns: the number of results deleted
    pub async fn delete_source(&self, source_url: &str, sources: &dyn SourceContent) -> Result<u64> {
        if !self.config.enable_delete_source {
            bail!("Deleting sources is not enabled (set enable_delete_source)");
        }

        let source_url = clean_source_url(source_url, &self.config.source_query_strings_to_remove)
            .with_context(|| format!("Invalid source URL '{source_url}'"))?;

        let removed = self.repo.delete_by_source(&source_url).await?;
        sources
            .remove(&source_url)
            .with_context(|| format!("Removing source {source_url}"))?;

        info!("Deleted source {} and {} result(s)", source_url, removed);
        Ok(removed)
    }
}

// Normalizes a source URL for storage.
//
// Returns None unless the URL is absolute http(s). Tracking parameters
// (utm_source, ...) are dropped; an emptied query disappears entirely.
//
// Example:
//   "https://site.example/post/?utm_source=mail&p=2" -> "https://site.example/post/?p=2"
pub fn clean_source_url(source_url: &str, strip: &[String]) -> Option<String> {
    let mut url = Url::parse(source_url.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !strip.iter().any(|s| s == key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::checker::{OmitKind, Omissions};
    use crate::config::Settings;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(tweak: impl FnOnce(&mut Settings)) -> Arc<SiteConfig> {
        let mut settings = Settings {
            site_url: "https://site.example".to_string(),
            ..Settings::default()
        };
        tweak(&mut settings);
        Arc::new(settings.into_site_config().unwrap())
    }

    fn manager(config: Arc<SiteConfig>) -> ResultManager {
        ResultManager::new(Arc::new(MemoryResults::default()), config)
    }

    fn classifier(config: Arc<SiteConfig>) -> LinkClassifier {
        LinkClassifier::new(config, CacheStore::in_memory(0)).unwrap()
    }

    fn broken(link: &str, source: &str) -> NewResult {
        NewResult {
            status: StatusRecord::new(StatusType::Broken, 404, "Not Found", link),
            source_url: source.to_string(),
            location: Location::Content,
            author: Author::Guest,
            method: ScanMethod::SingleScan,
        }
    }

    #[test]
    fn test_clean_source_url() {
        let strip = vec!["utm_source".to_string(), "blinks".to_string()];
        assert_eq!(
            clean_source_url("https://site.example/post/?utm_source=mail&p=2", &strip).as_deref(),
            Some("https://site.example/post/?p=2")
        );
        assert_eq!(
            clean_source_url("https://site.example/post/?blinks=true", &strip).as_deref(),
            Some("https://site.example/post/")
        );
        assert_eq!(clean_source_url("ftp://site.example/", &strip), None);
        assert_eq!(clean_source_url("/relative", &strip), None);
    }

    #[test]
    fn test_author_and_method_labels() {
        assert_eq!(Author::from_id(0), Author::Guest);
        assert_eq!(Author::from_id(7).id(), Some(7));
        for method in [ScanMethod::Visit, ScanMethod::SingleScan, ScanMethod::MultiScan] {
            assert_eq!(ScanMethod::parse(method.as_str()), Some(method));
        }
    }

    #[tokio::test]
    async fn test_add_dedups_by_link() {
        let m = manager(config(|_| {}));
        let first = m.add(broken("https://gone.example/", "https://site.example/a")).await.unwrap();
        let second = m.add(broken("https://gone.example/", "https://site.example/b")).await.unwrap();

        assert!(matches!(first, AddOutcome::Added(_)));
        assert_eq!(second, AddOutcome::AlreadyAdded);
        assert_eq!(m.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_source() {
        let m = manager(config(|_| {}));
        let outcome = m.add(broken("https://gone.example/", "not a url")).await.unwrap();
        assert_eq!(outcome, AddOutcome::InvalidSource);
        assert!(m.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let m = manager(config(|_| {}));
        m.add(broken("https://a.example/", "https://site.example/")).await.unwrap();
        let AddOutcome::Added(id) = m.add(broken("https://b.example/", "https://site.example/")).await.unwrap()
        else {
            panic!("expected a new record");
        };

        assert!(m.remove("https://a.example/").await.unwrap());
        assert!(!m.remove("https://a.example/").await.unwrap());
        assert!(m.clear(id).await.unwrap());
        assert!(m.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reverify_source_gone() {
        let cfg = config(|_| {});
        let m = manager(cfg.clone());
        let AddOutcome::Added(id) = m.add(broken("https://gone.example/", "https://site.example/old")).await.unwrap()
        else {
            panic!("expected a new record");
        };

        let outcome = m.reverify(id, &classifier(cfg), &MemorySource::default()).await.unwrap();
        let ReverifyOutcome::Removed(status) = outcome else {
            panic!("expected removal, got {outcome:?}");
        };
        assert_eq!(status.status_type, StatusType::NotApplicable);
        assert_eq!(status.code, 404);
        assert_eq!(status.text, "Source no longer exists.");
        assert!(m.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reverify_good_now_removes() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/back"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let cfg = config(|_| {});
        let m = manager(cfg.clone());
        let link = format!("{}/back", server.uri());
        let AddOutcome::Added(id) = m.add(broken(&link, "https://site.example/post")).await.unwrap() else {
            panic!("expected a new record");
        };
        let sources = MemorySource::with_pages([("https://site.example/post", "<a>")]);

        let outcome = m.reverify(id, &classifier(cfg), &sources).await.unwrap();
        assert!(matches!(outcome, ReverifyOutcome::Removed(ref s) if s.status_type == StatusType::Good));
        assert!(m.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reverify_link_omitted_since() {
        let cfg = config(|_| {});
        let m = manager(cfg.clone());
        let AddOutcome::Added(id) = m
            .add(broken("https://partner.example/deal", "https://site.example/post"))
            .await
            .unwrap()
        else {
            panic!("expected a new record");
        };
        let sources = MemorySource::with_pages([("https://site.example/post", "")]);

        let mut omissions = Omissions::default();
        omissions.add(OmitKind::Link, "https://partner.example/*");
        let checker = classifier(cfg).with_omissions(omissions);

        let outcome = m.reverify(id, &checker, &sources).await.unwrap();
        let ReverifyOutcome::Removed(status) = outcome else {
            panic!("expected removal, got {outcome:?}");
        };
        assert_eq!(status.status_type, StatusType::Omitted);
        assert_eq!(status.text, "Omitted");
        assert!(m.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reverify_source_page_omitted() {
        let cfg = config(|_| {});
        let m = manager(cfg.clone());
        let AddOutcome::Added(id) = m
            .add(broken("https://gone.example/", "https://site.example/contact/"))
            .await
            .unwrap()
        else {
            panic!("expected a new record");
        };
        let sources = MemorySource::with_pages([("https://site.example/contact/", "")]);

        let mut omissions = Omissions::default();
        omissions.add(OmitKind::Page, "https://site.example/contact");
        let checker = classifier(cfg).with_omissions(omissions);

        let outcome = m.reverify(id, &checker, &sources).await.unwrap();
        let ReverifyOutcome::Removed(status) = outcome else {
            panic!("expected removal, got {outcome:?}");
        };
        assert_eq!(status.status_type, StatusType::NotApplicable);
        assert_eq!(status.code, 404);
        assert_eq!(status.text, "Source page is omitted.");
        assert!(m.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reverify_changed_code_updates() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let cfg = config(|_| {});
        let m = manager(cfg.clone());
        let link = format!("{}/flaky", server.uri());
        let AddOutcome::Added(id) = m.add(broken(&link, "https://site.example/post")).await.unwrap() else {
            panic!("expected a new record");
        };
        let sources = MemorySource::with_pages([("https://site.example/post", "")]);

        let outcome = m.reverify(id, &classifier(cfg), &sources).await.unwrap();
        let ReverifyOutcome::Updated { new_id, status } = outcome else {
            panic!("expected an update, got {outcome:?}");
        };
        assert_ne!(new_id, id);
        assert_eq!(status.code, 400);

        let stored = m.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].code, 400);
        assert_eq!(stored[0].source_url, "https://site.example/post");
    }

    #[tokio::test]
    async fn test_reverify_same_status_is_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cfg = config(|_| {});
        let m = manager(cfg.clone());
        let link = format!("{}/gone", server.uri());
        let AddOutcome::Added(id) = m.add(broken(&link, "https://site.example/post")).await.unwrap() else {
            panic!("expected a new record");
        };
        let sources = MemorySource::with_pages([("https://site.example/post", "")]);

        let outcome = m.reverify(id, &classifier(cfg), &sources).await.unwrap();
        assert!(matches!(outcome, ReverifyOutcome::Unchanged(_)));
        assert!(m.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_replace_rewrites_source() {
        let m = manager(config(|_| {}));
        let AddOutcome::Added(id) = m
            .add(broken("https://old.example/x", "https://site.example/post"))
            .await
            .unwrap()
        else {
            panic!("expected a new record");
        };
        let sources = MemorySource::with_pages([(
            "https://site.example/post",
            r#"<a href="https://old.example/x">x</a>"#,
        )]);

        m.replace(id, "https://new.example/x", &sources).await.unwrap();

        assert_eq!(
            sources.read("https://site.example/post").unwrap(),
            r#"<a href="https://new.example/x">x</a>"#
        );
        assert!(m.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_missing_source_keeps_record() {
        let m = manager(config(|_| {}));
        let AddOutcome::Added(id) = m.add(broken("https://old.example/", "https://site.example/gone")).await.unwrap()
        else {
            panic!("expected a new record");
        };

        assert!(m.replace(id, "https://new.example/", &MemorySource::default()).await.is_err());
        assert!(m.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_source_requires_setting() {
        let m = manager(config(|_| {}));
        let sources = MemorySource::with_pages([("https://site.example/post", "")]);
        assert!(m.delete_source("https://site.example/post", &sources).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_source_removes_results_and_page() {
        let m = manager(config(|s| s.enable_delete_source = true));
        m.add(broken("https://a.example/", "https://site.example/post")).await.unwrap();
        m.add(broken("https://b.example/", "https://site.example/post")).await.unwrap();
        m.add(broken("https://c.example/", "https://site.example/other")).await.unwrap();
        let sources = MemorySource::with_pages([("https://site.example/post", ""), ("https://site.example/other", "")]);

        let removed = m.delete_source("https://site.example/post", &sources).await.unwrap();
        assert_eq!(removed, 2);
        assert!(!sources.exists("https://site.example/post"));
        assert_eq!(m.list().await.unwrap().len(), 1);
    }
}
