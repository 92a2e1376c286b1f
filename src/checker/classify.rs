// src/checker/classify.rs
// =============================================================================
// The link classifier: turns any raw href into a StatusRecord.
//
// Decision order, first match wins:
//    1. rewriter rejects the href          -> omitted 200 "No link found"
//    2. rewriter answers with a partial    -> broken 0 "Did not pass ..."
//    3. rewriter answers with a status     -> that status
//    4. literal substitutions (× -> x)
//    5. "//host/x" gets the current scheme
//    6. whitespace-only                    -> good 200 "Skipping null"
//    7. starts with # or ?                 -> good 200 "Skipping: ..."
//    8. on the omitted links list          -> omitted 200 "Omitted"
//    9. exactly empty                      -> broken 0 "Empty link"
//   10. local and resolves to content      -> good 200 "OK"
//   11. local but unknown                  -> remote check
//   12. non-HTTP scheme                    -> good 200 "Skipping: Non-Http URL Schema"
//   13. everything else                    -> cache, then remote check
//
// check_link never fails. Every problem ends up in the returned record.
// =============================================================================

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::debug;

use super::hooks::{LinkRewriter, PassThrough, PreCheck, StatusPostProcessor};
use super::http::RemoteChecker;
use super::local::{KnownPaths, LocalResolver};
use super::omits::Omissions;
use super::schemes::scheme_of;
use super::status::{StatusRecord, StatusType, CODE_NO_RESPONSE};
use crate::cache::CacheStore;
use crate::config::SiteConfig;

pub struct LinkClassifier {
    config: Arc<SiteConfig>,
    remote: RemoteChecker,
    cache: CacheStore,
    omissions: Omissions,
    rewriter: Arc<dyn LinkRewriter>,
    resolver: Arc<dyn LocalResolver>,
}

impl LinkClassifier {
    /// A classifier with the configured omissions and local paths and no
    /// rewriting hooks.
    pub fn new(config: Arc<SiteConfig>, cache: CacheStore) -> Result<Self, reqwest::Error> {
        let remote = RemoteChecker::new(config.clone())?;
        let omissions = Omissions::from_config(&config);
        let resolver = Arc::new(KnownPaths::new(&config.site_url, &config.local_paths));

        Ok(Self {
            config,
            remote,
            cache,
            omissions,
            rewriter: Arc::new(PassThrough),
            resolver,
        })
    }

    pub fn with_omissions(mut self, omissions: Omissions) -> Self {
        self.omissions = omissions;
        self
    }

    pub fn with_rewriter(mut self, rewriter: Arc<dyn LinkRewriter>) -> Self {
        self.rewriter = rewriter;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn LocalResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_post_processor(mut self, post_processor: Arc<dyn StatusPostProcessor>) -> Self {
        self.remote = self.remote.with_post_processor(post_processor);
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn omissions(&self) -> &Omissions {
        &self.omissions
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    // Classifies one href.
    //
    // Parameters:
    //   href: the raw attribute value, as extracted from the page
    //
    // Returns: the status record. `link` is the href after rewriting and
    // normalization, except for the pre-check answers which keep the input.
    pub async fn check_link(&self, href: &str) -> StatusRecord {
        let href = match self.rewriter.rewrite(href) {
            PreCheck::Link(link) => link,
            PreCheck::Reject => {
                return StatusRecord::new(StatusType::Omitted, 200, "No link found", href);
            }
            PreCheck::Status(partial) => {
                let missing = partial.missing_fields();
                let link = partial.link.clone().unwrap_or_else(|| href.to_string());
                return match partial.complete(href) {
                    Some(status) => status,
                    None => StatusRecord::new(
                        StatusType::Broken,
                        CODE_NO_RESPONSE,
                        format!("Did not pass pre-check filter: missing {}", missing.join(", ")),
                        link,
                    ),
                };
            }
        };

        let href = self.normalize(&href);

        if !href.is_empty() && href.trim().is_empty() {
            return StatusRecord::skipped("Skipping null", href);
        }

        if let Some(marker) = href.chars().next().filter(|c| *c == '#' || *c == '?') {
            return StatusRecord::skipped(format!("Skipping: starts with {marker}"), href);
        }

        if self.omissions.is_link_omitted(&href) {
            return StatusRecord::new(StatusType::Omitted, 200, "Omitted", href);
        }

        if href.is_empty() {
            return StatusRecord::new(StatusType::Broken, CODE_NO_RESPONSE, "Empty link", href);
        }

        if self.is_local(&href) {
            if let Some(id) = self.resolver.resolve(&href) {
                debug!("{} resolves to local content #{}", href, id);
                return StatusRecord::new(StatusType::Good, 200, "OK", href);
            }
            return self.check_remote(&href).await;
        }

        if let Some(scheme) = scheme_of(&href) {
            if self.config.url_schemes.contains(&scheme) {
                return StatusRecord::skipped("Skipping: Non-Http URL Schema", href);
            }
        }

        self.check_remote(&href).await
    }

    // Classifies many hrefs with at most `max_concurrency` checks in flight.
    //
    // Results come back in completion order, each paired with the tag it
    // was submitted with.
    pub async fn check_tagged<T: Send>(&self, links: Vec<(T, String)>) -> Vec<(T, StatusRecord)> {
        stream::iter(links.into_iter().map(|(tag, href)| async move {
            let status = self.check_link(&href).await;
            (tag, status)
        }))
        .buffer_unordered(self.config.max_concurrency.max(1))
        .collect()
        .await
    }

    pub async fn check_links(&self, hrefs: Vec<String>) -> Vec<StatusRecord> {
        let tagged = hrefs.into_iter().map(|href| ((), href)).collect();
        self.check_tagged(tagged)
            .await
            .into_iter()
            .map(|(_, status)| status)
            .collect()
    }

    async fn check_remote(&self, href: &str) -> StatusRecord {
        if let Some(cached) = self.cache.get(href).await {
            return cached;
        }
        let status = self.remote.check_url_status_code(href, None).await;
        self.cache.put(&status).await;
        status
    }

    // Steps 4 and 5: literal substitutions, then protocol-relative hrefs
    fn normalize(&self, href: &str) -> String {
        let mut link = href.to_string();
        for (from, to) in &self.config.link_substitutions {
            if !from.is_empty() {
                link = link.replace(from.as_str(), to);
            }
        }

        if link.starts_with("//") {
            link = format!("{}:{}", self.config.current_scheme, link);
        }
        link
    }

    fn is_local(&self, href: &str) -> bool {
        if href.starts_with('/') {
            return true;
        }
        match href.strip_prefix(self.config.site_url.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
            None => false,
        }
    }
}
