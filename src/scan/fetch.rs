// src/scan/fetch.rs
// =============================================================================
// Fetching the pages to scan.
//
// A scan downloads the page itself with a plain GET (the links on it are
// then checked by the classifier, HEAD or GET per its own rules). Pages
// that answer with an error status are not scanned: the page being down is
// a problem for the monitoring side, not a list of broken links.
// =============================================================================

use anyhow::{anyhow, Context, Result};
use reqwest::header::USER_AGENT;
use reqwest::Client;

use crate::config::SiteConfig;

/// Builds the client used to download pages.
pub fn page_client(config: &SiteConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout.max(std::time::Duration::from_secs(10)))
        .danger_accept_invalid_certs(!config.ssl_verify)
        .build()
        .context("Failed to build page client")
}

// Fetches a web page and returns its HTML content
//
// Parameters:
//   client: shared page client
//   url: the page to download
//   user_agent: sent as the User-Agent header
//
// Returns: the body text, or an error for transport failures and
// non-success statuses
pub async fn fetch_page(client: &Client, url: &str, user_agent: &str) -> Result<String> {
    let response = client
        .get(url)
        .header(USER_AGENT, user_agent)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;

    if !response.status().is_success() {
        return Err(anyhow!("HTTP {} for {}", response.status(), url));
    }

    let html = response.text().await?;
    Ok(html)
}

// Reads a multi-scan list: one URL per line. Blank lines and lines starting
// with '#' are skipped, duplicates are dropped (first one wins).
pub fn parse_url_list(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !urls.iter().any(|u| u == line) {
            urls.push(line.to_string());
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_page_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/post"))
            .and(header("user-agent", "tester"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"/x\">x</a>"))
            .mount(&server)
            .await;

        let client = page_client(&SiteConfig::default()).unwrap();
        let html = fetch_page(&client, &format!("{}/post", server.uri()), "tester")
            .await
            .unwrap();
        assert!(html.contains("href"));
    }

    #[tokio::test]
    async fn test_fetch_page_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = page_client(&SiteConfig::default()).unwrap();
        let err = fetch_page(&client, &server.uri(), "tester").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_parse_url_list() {
        let text = "# pages\nhttps://a.example/\n\n  https://b.example/  \nhttps://a.example/\n";
        assert_eq!(parse_url_list(text), vec!["https://a.example/", "https://b.example/"]);
    }
}
