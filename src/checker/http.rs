// src/checker/http.rs
// =============================================================================
// This module checks if URLs are alive by making a single HTTP request.
//
// Key functionality:
// - HEAD by default (no body download)
// - GET when redirects are allowed, except for media (and optionally
//   document) files, which stay on HEAD so we never pull a large payload
//   just to read a status code
// - YouTube watch links are checked through their oEmbed endpoint
// - Transport failures become code 0; invalid URLs and unresolvable hosts
//   become the 666 sentinel
// - A GET announcing more than 10 MiB is recoded to 413
//
// There are no retries. One failed request is the answer for this check; the
// next scan is the retry.
// =============================================================================

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::header::{CONTENT_LENGTH, USER_AGENT};
use reqwest::{Client, Method};
use url::Url;

use super::hooks::{NoPostProcess, StatusPostProcessor};
use super::oembed::oembed_url;
use super::status::{StatusRecord, CODE_INVALID_URL, CODE_NO_RESPONSE};
use super::taxonomy;
use crate::config::{SiteConfig, LARGE_FILE_THRESHOLD};

/// Transport message for a URL that could not even be parsed.
pub const INVALID_URL_MESSAGE: &str = "A valid URL was not provided.";
/// Prefix of the transport message for a DNS failure.
pub const UNRESOLVED_HOST_MESSAGE: &str = "Could not resolve host";

// What came back from the transport, before classification
struct Outcome {
    code: u16,
    error: String,
    content_length: Option<u64>,
}

/// Issues the actual outbound check for one URL.
pub struct RemoteChecker {
    config: Arc<SiteConfig>,
    client: Client,
    post_processor: Arc<dyn StatusPostProcessor>,
}

impl RemoteChecker {
    /// Builds the shared HTTP client from the site configuration.
    ///
    /// The client is reused for every check (connection pooling). Timeout,
    /// method and user agent are set per request.
    pub fn new(config: Arc<SiteConfig>) -> Result<Self, reqwest::Error> {
        let redirect = if config.max_redirects == 0 {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(config.max_redirects)
        };

        let client = Client::builder()
            .redirect(redirect)
            .danger_accept_invalid_certs(!config.ssl_verify)
            .http1_only()
            .build()?;

        Ok(Self {
            config,
            client,
            post_processor: Arc::new(NoPostProcess),
        })
    }

    pub fn with_post_processor(mut self, post_processor: Arc<dyn StatusPostProcessor>) -> Self {
        self.post_processor = post_processor;
        self
    }

    // Checks one URL and classifies the answer.
    //
    // Parameters:
    //   url: absolute, or root-relative to the site URL
    //   timeout: overrides the configured timeout for this request
    //
    // Returns: the status record, with `link` set to the URL as given
    pub async fn check_url_status_code(&self, url: &str, timeout: Option<Duration>) -> StatusRecord {
        let timeout = timeout.unwrap_or(self.config.timeout);

        let target = if url.starts_with('/') {
            format!("{}{}", self.config.site_url, url)
        } else {
            url.to_string()
        };

        // oEmbed answers are a few hundred bytes, so they are always fetched
        let (request_url, method) = match oembed_url(&target) {
            Some(oembed) => (oembed, Method::GET),
            None => {
                let method = self.select_method(&target);
                (target, method)
            }
        };

        let outcome = self.send(&request_url, method.clone(), timeout).await;

        let mut code = outcome.code;
        if code == CODE_NO_RESPONSE && is_invalid_url_error(&outcome.error) {
            code = CODE_INVALID_URL;
        }
        if method == Method::GET && outcome.content_length.is_some_and(|len| len > LARGE_FILE_THRESHOLD) {
            debug!("{} announces {:?} bytes, recoding to 413", request_url, outcome.content_length);
            code = 413;
        }

        let text = taxonomy::label(code)
            .map(str::to_string)
            .unwrap_or(outcome.error);

        let status = StatusRecord::new(self.config.classify(code), code, text, url);
        debug!("{} {} -> {} {}", method, request_url, status.code, status.status_type);

        self.post_processor.process(status)
    }

    // HEAD unless redirects are allowed; media (and, when configured,
    // documents) always stay on HEAD.
    fn select_method(&self, url: &str) -> Method {
        if !self.config.allow_redirects {
            return Method::HEAD;
        }

        match extension_of(url) {
            Some(ext) if self.config.binary_extensions.contains(&ext) => Method::HEAD,
            Some(ext) if self.config.documents_use_head && self.config.document_extensions.contains(&ext) => {
                Method::HEAD
            }
            _ => Method::GET,
        }
    }

    // Some social hosts refuse anything that does not look like a browser
    fn user_agent_for(&self, url: &Url) -> &str {
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let is_social = self
            .config
            .social_hosts
            .iter()
            .any(|social| host == *social || host.ends_with(&format!(".{social}")));

        if is_social {
            &self.config.social_user_agent
        } else {
            &self.config.user_agent
        }
    }

    async fn send(&self, url: &str, method: Method, timeout: Duration) -> Outcome {
        let parsed = match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some() => parsed,
            _ => return transport_failure(INVALID_URL_MESSAGE.to_string()),
        };

        let result = self
            .client
            .request(method, parsed.clone())
            .timeout(timeout)
            .header(USER_AGENT, self.user_agent_for(&parsed))
            .send()
            .await;

        match result {
            Ok(response) => {
                let content_length = response
                    .headers()
                    .get(CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok());

                Outcome {
                    code: response.status().as_u16(),
                    error: "Unknown".to_string(),
                    content_length,
                }
            }
            Err(e) => transport_failure(describe_transport_error(&e, &parsed, timeout)),
        }
    }
}

fn transport_failure(error: String) -> Outcome {
    Outcome {
        code: CODE_NO_RESPONSE,
        error,
        content_length: None,
    }
}

// Invalid URLs and DNS failures are folded into the 666 sentinel so they can
// be told apart from a host that simply did not answer.
fn is_invalid_url_error(error: &str) -> bool {
    error.starts_with(INVALID_URL_MESSAGE.trim_end_matches('.')) || error.contains(UNRESOLVED_HOST_MESSAGE)
}

// Turns a reqwest error into a transport message.
//
// reqwest errors can happen for many reasons:
// - the URL could not be turned into a request
// - DNS resolution failure
// - connection refused / reset
// - timeout
// - too many redirects
// - TLS certificate problems
fn describe_transport_error(error: &reqwest::Error, url: &Url, timeout: Duration) -> String {
    let chain = error_chain(error);
    let host = url.host_str().unwrap_or_default();

    if error.is_builder() {
        INVALID_URL_MESSAGE.to_string()
    } else if error.is_timeout() {
        format!("Operation timed out after {} milliseconds", timeout.as_millis())
    } else if error.is_redirect() {
        "Too many redirects".to_string()
    } else if chain.contains("dns error") || chain.contains("failed to lookup address") {
        format!("{UNRESOLVED_HOST_MESSAGE}: {host}")
    } else if chain.contains("certificate") || chain.contains("ssl") {
        format!("SSL certificate problem: {}", root_cause(error))
    } else if error.is_connect() {
        format!("Failed to connect to {host}: {}", root_cause(error))
    } else {
        chain
    }
}

// Lowercased causes of an error. The top-level message is skipped because
// reqwest embeds the request URL in it.
fn error_chain(error: &reqwest::Error) -> String {
    let mut causes = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    if causes.is_empty() {
        causes.push(error.to_string());
    }
    causes.join(": ").to_lowercase()
}

fn root_cause(error: &reqwest::Error) -> String {
    let mut current: &dyn StdError = error;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

// Lowercased extension of the last path segment, if any
fn extension_of(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why HEAD by default?
//    - A HEAD answers with the same status line as a GET, without the body
//    - Most sites handle it fine; the ones that don't can be switched to GET
//      with allow_redirects
//
// 2. Why is 666 not a real HTTP code?
//    - It is our own sentinel for "this URL can never work" (bad syntax or
//      no DNS record), as opposed to 0 which means "nobody answered this time"
//
// 3. Why look at Content-Length instead of downloading?
//    - The response is dropped as soon as the headers arrive; the announced
//      size is enough to warn about oversized files
// -----------------------------------------------------------------------------
