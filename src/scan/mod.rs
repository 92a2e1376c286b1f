// src/scan/mod.rs
// =============================================================================
// Page scanning: the pipeline that ties extraction, classification, result
// storage and notification together.
//
// For one page:
// 1. Skip it entirely when the page is on the omitted pages list
// 2. Extract links, remembering whether each sits in the header, the
//    content or the footer
// 3. Classify every link, at most max_concurrency at a time
// 4. Split flagged (broken/warning) from the rest
// 5. Notify once if anything is flagged
// 6. Store flagged links (and good ones when also_store_good is set),
//    deduplicated by link
//
// Nothing in here aborts a scan because of one link: store and notifier
// failures are logged and the scan carries on.
// =============================================================================

mod fetch;

pub use fetch::{fetch_page, page_client, parse_url_list};

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use log::{error, info, warn};
use reqwest::Client;
use serde::Serialize;

use crate::checker::{extract_page_links, LinkClassifier, Location, StatusRecord, StatusType};
use crate::notify::{FlaggedLink, NotifierSet, NotifyBatch};
use crate::results::{AddOutcome, Author, NewResult, ResultManager, ScanMethod};

/// One checked link of a scanned page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedLink {
    pub location: Location,
    #[serde(flatten)]
    pub status: StatusRecord,
}

/// Outcome of scanning one page.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub source_url: String,
    pub method: ScanMethod,
    /// The page is omitted and was not scanned
    pub skipped: bool,
    pub links: Vec<ScannedLink>,
    pub broken: usize,
    pub warning: usize,
    pub good: usize,
    pub omitted: usize,
    /// Results newly stored by this scan
    pub stored: usize,
    pub notified: bool,
    pub seconds: f64,
    pub seconds_per_link: f64,
}

impl ScanReport {
    fn empty(source_url: &str, method: ScanMethod) -> Self {
        Self {
            source_url: source_url.to_string(),
            method,
            skipped: false,
            links: Vec::new(),
            broken: 0,
            warning: 0,
            good: 0,
            omitted: 0,
            stored: 0,
            notified: false,
            seconds: 0.0,
            seconds_per_link: 0.0,
        }
    }

    pub fn flagged(&self) -> usize {
        self.broken + self.warning
    }
}

pub struct Scanner {
    classifier: Arc<LinkClassifier>,
    results: Arc<ResultManager>,
    notifier: NotifierSet,
    client: Client,
}

impl Scanner {
    pub fn new(
        classifier: Arc<LinkClassifier>,
        results: Arc<ResultManager>,
        notifier: NotifierSet,
    ) -> Result<Self> {
        let client = page_client(classifier.config())?;
        Ok(Self {
            classifier,
            results,
            notifier,
            client,
        })
    }

    pub fn classifier(&self) -> &LinkClassifier {
        &self.classifier
    }

    // Scans HTML that was already obtained for `source_url`.
    //
    // Parameters:
    //   source_url: the page the markup belongs to
    //   html: the page markup
    //   method: how the scan was triggered (stored with each result)
    //   author: who triggered it
    pub async fn scan_page(&self, source_url: &str, html: &str, method: ScanMethod, author: Author) -> ScanReport {
        let mut report = ScanReport::empty(source_url, method);

        if self.classifier.omissions().is_page_omitted(source_url) {
            info!("{} is omitted, not scanning", source_url);
            report.skipped = true;
            return report;
        }

        let started = Instant::now();
        let config = self.classifier.config();
        let located = extract_page_links(html, &config.html_link_sources).into_located();
        info!("Checking {} link(s) on {}", located.len(), source_url);

        let checked = self.classifier.check_tagged(located).await;

        let mut flagged = Vec::new();
        for (location, status) in checked {
            match status.status_type {
                StatusType::Broken => report.broken += 1,
                StatusType::Warning => report.warning += 1,
                StatusType::Omitted => report.omitted += 1,
                StatusType::Good | StatusType::NotApplicable => report.good += 1,
            }
            if status.status_type.is_flagged() {
                flagged.push(FlaggedLink {
                    location,
                    status: status.clone(),
                    previously_flagged: self.already_recorded(&status.link).await,
                });
            }
            report.links.push(ScannedLink { location, status });
        }

        if !flagged.is_empty() {
            let batch = NotifyBatch {
                source_url: source_url.to_string(),
                flagged,
            };
            let failures = self.notifier.notify(&batch).await;
            report.notified = failures < self.notifier.len();
        }

        for link in &report.links {
            let keep = link.status.status_type.is_flagged()
                || (config.also_store_good && link.status.status_type == StatusType::Good);
            if !keep {
                continue;
            }

            let new = NewResult {
                status: link.status.clone(),
                source_url: source_url.to_string(),
                location: link.location,
                author,
                method,
            };
            match self.results.add(new).await {
                Ok(AddOutcome::Added(_)) => report.stored += 1,
                Ok(AddOutcome::AlreadyAdded) => {}
                Ok(AddOutcome::InvalidSource) => {
                    warn!("Not storing {}: invalid source {}", link.status.link, source_url);
                }
                Err(e) => error!("Storing {} failed: {}", link.status.link, e),
            }
        }

        report.seconds = started.elapsed().as_secs_f64();
        if !report.links.is_empty() {
            report.seconds_per_link = report.seconds / report.links.len() as f64;
        }
        info!(
            "Results for {} were generated in {:.2} seconds ({:.2}/link)",
            source_url, report.seconds, report.seconds_per_link
        );

        report
    }

    /// Downloads a page and scans it.
    pub async fn scan_url(&self, url: &str, method: ScanMethod) -> Result<ScanReport> {
        if self.classifier.omissions().is_page_omitted(url) {
            let mut report = ScanReport::empty(url, method);
            report.skipped = true;
            return Ok(report);
        }

        let html = fetch_page(&self.client, url, &self.classifier.config().user_agent).await?;
        Ok(self.scan_page(url, &html, method, Author::Guest).await)
    }

    // Scans each page in turn. A page that cannot be fetched is logged and
    // left out of the returned reports.
    pub async fn multi_scan(&self, urls: &[String]) -> Vec<ScanReport> {
        let mut reports = Vec::with_capacity(urls.len());
        for (index, url) in urls.iter().enumerate() {
            info!("[{}/{}] {}", index + 1, urls.len(), url);
            match self.scan_url(url, ScanMethod::MultiScan).await {
                Ok(report) => reports.push(report),
                Err(e) => warn!("Skipping {}: {:#}", url, e),
            }
        }
        reports
    }

    async fn already_recorded(&self, link: &str) -> bool {
        match self.results.is_flagged(link).await {
            Ok(found) => found,
            Err(e) => {
                error!("Result lookup for {} failed: {}", link, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::config::{Settings, SiteConfig};
    use crate::error::NotifyError;
    use crate::notify::Notifier;
    use crate::results::MemoryResults;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<NotifyBatch>>);

    #[async_trait]
    impl Notifier for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn notify(&self, batch: &NotifyBatch) -> Result<(), NotifyError> {
            self.0.lock().unwrap().push(batch.clone());
            Ok(())
        }
    }

    struct Fixture {
        scanner: Scanner,
        results: Arc<ResultManager>,
        recorder: Arc<Recorder>,
    }

    fn fixture(site_url: &str, tweak: impl FnOnce(&mut Settings)) -> Fixture {
        let mut settings = Settings {
            site_url: site_url.to_string(),
            ..Settings::default()
        };
        tweak(&mut settings);
        let config: Arc<SiteConfig> = Arc::new(settings.into_site_config().unwrap());

        let classifier = Arc::new(LinkClassifier::new(config.clone(), CacheStore::in_memory(0)).unwrap());
        let results = Arc::new(ResultManager::new(Arc::new(MemoryResults::default()), config));
        let recorder = Arc::new(Recorder::default());
        let channels: Vec<Arc<dyn Notifier>> = vec![recorder.clone()];
        let notifier = NotifierSet::new(channels);
        let scanner = Scanner::new(classifier, results.clone(), notifier).unwrap();

        Fixture {
            scanner,
            results,
            recorder,
        }
    }

    #[tokio::test]
    async fn test_clean_page_flags_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let f = fixture(&server.uri(), |_| {});
        let html = format!(
            r##"<a href="{}/">ok</a><a href="#section">jump</a><a href="ftp://x/">file</a>"##,
            server.uri()
        );
        let report = f
            .scanner
            .scan_page("https://site.example/post", &html, ScanMethod::SingleScan, Author::Guest)
            .await;

        assert_eq!(report.links.len(), 3);
        assert_eq!(report.good, 3);
        assert_eq!(report.flagged(), 0);
        assert!(!report.notified);
        assert!(f.recorder.0.lock().unwrap().is_empty());
        assert!(f.results.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_local_page_is_stored_once() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/missing-page"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let f = fixture(&server.uri(), |_| {});
        let html = r#"<main><a href="/missing-page">gone</a></main>"#;
        let source = format!("{}/post", server.uri());

        let first = f.scanner.scan_page(&source, html, ScanMethod::SingleScan, Author::User(1)).await;
        let second = f.scanner.scan_page(&source, html, ScanMethod::SingleScan, Author::User(1)).await;

        assert_eq!(first.broken, 1);
        assert_eq!(first.stored, 1);
        assert_eq!(second.broken, 1);
        assert_eq!(second.stored, 0);

        let stored = f.results.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].link, "/missing-page");
        assert_eq!(stored[0].code, 404);
        assert_eq!(stored[0].location, Location::Content);
        assert_eq!(stored[0].author, Author::User(1));

        let batches = f.recorder.0.lock().unwrap();
        assert_eq!(batches.len(), 2);
        assert!(!batches[0].flagged[0].previously_flagged);
        assert!(batches[1].flagged[0].previously_flagged);
    }

    #[tokio::test]
    async fn test_locations_are_kept() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let f = fixture(&server.uri(), |_| {});
        let html = r#"<header><a href="/h">h</a></header><p><a href="/c">c</a></p><footer><a href="/f">f</a></footer>"#;
        f.scanner
            .scan_page("https://site.example/", html, ScanMethod::Visit, Author::Guest)
            .await;

        let mut stored: Vec<(String, Location)> = f
            .results
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.link, r.location))
            .collect();
        stored.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            stored,
            vec![
                ("/c".to_string(), Location::Content),
                ("/f".to_string(), Location::Footer),
                ("/h".to_string(), Location::Header),
            ]
        );
    }

    #[tokio::test]
    async fn test_omitted_page_is_skipped() {
        let f = fixture("https://site.example", |s| {
            s.omitted_pages = vec!["https://site.example/contact/".to_string()];
        });
        let report = f
            .scanner
            .scan_page("https://site.example/contact", r#"<a href="">x</a>"#, ScanMethod::Visit, Author::Guest)
            .await;
        assert!(report.skipped);
        assert!(report.links.is_empty());
    }

    #[tokio::test]
    async fn test_also_store_good() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let f = fixture(&server.uri(), |s| s.also_store_good = true);
        let report = f
            .scanner
            .scan_page("https://site.example/", r#"<a href="/fine">x</a><a href="mailto:a@b.c">m</a>"#, ScanMethod::Visit, Author::Guest)
            .await;
        assert_eq!(report.stored, 2);
        assert!(!report.notified);
    }

    #[tokio::test]
    async fn test_scan_url_and_multi_scan() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="/dead">dead</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/dead"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let f = fixture(&server.uri(), |_| {});
        let urls = vec![format!("{}/page", server.uri()), format!("{}/down", server.uri())];
        let reports = f.scanner.multi_scan(&urls).await;

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].broken, 1);
        assert_eq!(reports[0].method, ScanMethod::MultiScan);
        assert_eq!(f.results.list().await.unwrap()[0].method, ScanMethod::MultiScan);
    }
}
