// src/config.rs
// =============================================================================
// Site configuration.
//
// Settings are layered with the `config` crate:
//   1. built-in defaults (the serde defaults on `Settings`)
//   2. an optional file (link-notifier.toml, or --config <path>)
//   3. LINK_NOTIFIER_* environment variables (`__` separates nested keys)
//
// The loaded `Settings` are validated once and frozen into a `SiteConfig`
// that is shared through an Arc. Nothing below main reads the environment.
// =============================================================================

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment, File};
use serde::Deserialize;
use url::Url;

use crate::checker::{builtin_url_schemes, StatusType};
use crate::error::SettingsError;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
/// Default number of redirects the transport may follow.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
/// GET responses announcing more than this many bytes are recoded to 413.
pub const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;
/// Uniqueness of cache rows is enforced on this many leading characters.
pub const CACHE_KEY_LENGTH: usize = 191;
/// Upper bound on concurrent outbound checks when the setting is 0.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// `{version}` and `{site_url}` are substituted at load time.
pub const DEFAULT_USER_AGENT_TEMPLATE: &str = "link-notifier/{version}; {site_url}";

/// Sent instead of the tool's own agent to hosts that refuse generic bots.
pub const DEFAULT_SOCIAL_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const DEFAULT_SOCIAL_HOSTS: &[&str] = &[
    "facebook.com",
    "instagram.com",
    "linkedin.com",
    "twitter.com",
    "x.com",
    "tiktok.com",
    "pinterest.com",
];

const DEFAULT_BINARY_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "svg", "bmp", "ico", "tif", "tiff", "avif", "heic",
    "mp4", "m4v", "mov", "avi", "wmv", "webm", "mkv", "flv", "mpg", "mpeg",
    "mp3", "wav", "ogg", "oga", "flac", "aac", "m4a", "wma",
];

const DEFAULT_DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "csv",
    "zip", "rar", "7z", "gz", "tar",
];

/// A webhook channel for flagged-link batches.
///
/// The endpoint receives the batch JSON as is (`source_url` plus the
/// `flagged` links). Discord and Microsoft Teams webhooks expect their own
/// message formats (`content`/`embeds`, cards) and reject that body, so
/// point this at a relay that formats the message, not at the chat service
/// directly.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WebhookSettings {
    /// Label used in logs, e.g. "discord-relay"
    pub name: String,
    /// Relay endpoint that receives the batch JSON
    pub url: String,
}

/// Raw, deserializable settings. Every field has a default so an empty
/// configuration is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub site_url: String,
    pub current_scheme: Option<String>,
    pub timeout: u64,
    pub max_redirects: usize,
    pub ssl_verify: bool,
    pub allow_redirects: bool,
    pub documents_use_head: bool,
    pub cache_ttl_seconds: u64,
    pub bad_codes: Vec<u16>,
    pub warning_codes: Vec<u16>,
    pub warnings_enabled: bool,
    pub user_agent_template: String,
    pub social_user_agent: String,
    pub social_hosts: Vec<String>,
    pub html_link_sources: BTreeMap<String, String>,
    pub extra_url_schemes: Vec<String>,
    pub omitted_links: Vec<String>,
    pub omitted_pages: Vec<String>,
    pub link_substitutions: BTreeMap<String, String>,
    pub binary_extensions: Vec<String>,
    pub document_extensions: Vec<String>,
    pub also_store_good: bool,
    pub source_query_strings_to_remove: Vec<String>,
    pub local_paths: Vec<String>,
    pub content_root: Option<PathBuf>,
    pub database_path: PathBuf,
    pub max_concurrency: usize,
    pub enable_delete_source: bool,
    pub webhooks: Vec<WebhookSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut html_link_sources = BTreeMap::new();
        html_link_sources.insert("a".to_string(), "href".to_string());

        let mut link_substitutions = BTreeMap::new();
        link_substitutions.insert("×".to_string(), "x".to_string());

        Self {
            site_url: "http://localhost".to_string(),
            current_scheme: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            ssl_verify: true,
            allow_redirects: false,
            documents_use_head: false,
            cache_ttl_seconds: 0,
            bad_codes: vec![666, 308, 400, 404, 408],
            warning_codes: vec![0, 413],
            warnings_enabled: true,
            user_agent_template: DEFAULT_USER_AGENT_TEMPLATE.to_string(),
            social_user_agent: DEFAULT_SOCIAL_USER_AGENT.to_string(),
            social_hosts: to_strings(DEFAULT_SOCIAL_HOSTS),
            html_link_sources,
            extra_url_schemes: Vec::new(),
            omitted_links: Vec::new(),
            omitted_pages: Vec::new(),
            link_substitutions,
            binary_extensions: to_strings(DEFAULT_BINARY_EXTENSIONS),
            document_extensions: to_strings(DEFAULT_DOCUMENT_EXTENSIONS),
            also_store_good: false,
            source_query_strings_to_remove: to_strings(&[
                "blinks",
                "utm_source",
                "utm_campaign",
                "utm_medium",
                "utm_term",
            ]),
            local_paths: Vec::new(),
            content_root: None,
            database_path: PathBuf::from("link-notifier.db"),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            enable_delete_source: false,
            webhooks: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads settings from an optional file and the environment.
    ///
    /// Without an explicit path, `link-notifier.toml` (or .yaml/.json) in the
    /// working directory is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("link-notifier").required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("LINK_NOTIFIER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Validates the settings and freezes them into a `SiteConfig`.
    pub fn into_site_config(self) -> Result<SiteConfig, SettingsError> {
        let parsed = Url::parse(&self.site_url)
            .map_err(|_| SettingsError::InvalidSiteUrl(self.site_url.clone()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(SettingsError::InvalidSiteUrl(self.site_url));
        }

        let site_url = self.site_url.trim_end_matches('/').to_string();
        let current_scheme = self
            .current_scheme
            .unwrap_or_else(|| parsed.scheme().to_string());

        let user_agent = self
            .user_agent_template
            .replace("{version}", env!("CARGO_PKG_VERSION"))
            .replace("{site_url}", &site_url);

        let mut url_schemes = builtin_url_schemes();
        url_schemes.extend(self.extra_url_schemes.iter().map(|s| s.to_ascii_lowercase()));

        Ok(SiteConfig {
            site_url,
            current_scheme,
            timeout: Duration::from_secs(self.timeout),
            max_redirects: self.max_redirects,
            ssl_verify: self.ssl_verify,
            allow_redirects: self.allow_redirects,
            documents_use_head: self.documents_use_head,
            cache_ttl_seconds: self.cache_ttl_seconds,
            bad_codes: self.bad_codes.into_iter().collect(),
            warning_codes: self.warning_codes.into_iter().collect(),
            warnings_enabled: self.warnings_enabled,
            user_agent,
            social_user_agent: self.social_user_agent,
            social_hosts: lowercase(self.social_hosts),
            html_link_sources: self
                .html_link_sources
                .into_iter()
                .map(|(tag, attr)| (tag.to_ascii_lowercase(), attr.to_ascii_lowercase()))
                .collect(),
            url_schemes,
            omitted_links: self.omitted_links,
            omitted_pages: self.omitted_pages,
            link_substitutions: self.link_substitutions.into_iter().collect(),
            binary_extensions: lowercase(self.binary_extensions),
            document_extensions: lowercase(self.document_extensions),
            also_store_good: self.also_store_good,
            source_query_strings_to_remove: self.source_query_strings_to_remove,
            local_paths: self.local_paths,
            content_root: self.content_root,
            database_path: self.database_path,
            max_concurrency: if self.max_concurrency == 0 {
                DEFAULT_MAX_CONCURRENCY
            } else {
                self.max_concurrency
            },
            enable_delete_source: self.enable_delete_source,
            webhooks: self.webhooks,
        })
    }
}

/// Immutable configuration injected into the classifier, the remote checker,
/// the cache store and the scanner.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Base URL of the site, without a trailing slash
    pub site_url: String,
    /// Scheme prefixed to protocol-relative hrefs
    pub current_scheme: String,
    pub timeout: Duration,
    pub max_redirects: usize,
    pub ssl_verify: bool,
    /// GET with redirects followed instead of a bare HEAD
    pub allow_redirects: bool,
    /// Documents are forced to HEAD like media files
    pub documents_use_head: bool,
    /// 0 disables the cache entirely
    pub cache_ttl_seconds: u64,
    pub bad_codes: HashSet<u16>,
    pub warning_codes: HashSet<u16>,
    pub warnings_enabled: bool,
    pub user_agent: String,
    pub social_user_agent: String,
    pub social_hosts: Vec<String>,
    /// (tag, attribute) pairs harvested by the extractor
    pub html_link_sources: Vec<(String, String)>,
    /// Lowercase non-HTTP URI schemes skipped by the classifier
    pub url_schemes: HashSet<String>,
    pub omitted_links: Vec<String>,
    pub omitted_pages: Vec<String>,
    /// Literal (from, to) replacements applied to every href
    pub link_substitutions: Vec<(String, String)>,
    pub binary_extensions: Vec<String>,
    pub document_extensions: Vec<String>,
    pub also_store_good: bool,
    pub source_query_strings_to_remove: Vec<String>,
    pub local_paths: Vec<String>,
    pub content_root: Option<PathBuf>,
    pub database_path: PathBuf,
    pub max_concurrency: usize,
    pub enable_delete_source: bool,
    pub webhooks: Vec<WebhookSettings>,
}

impl SiteConfig {
    /// Maps a status code to its classification under this configuration.
    ///
    /// Broken codes win over warning codes; warning codes only count while
    /// warnings are enabled; everything else is good.
    pub fn classify(&self, code: u16) -> StatusType {
        if self.bad_codes.contains(&code) {
            StatusType::Broken
        } else if self.warnings_enabled && self.warning_codes.contains(&code) {
            StatusType::Warning
        } else {
            StatusType::Good
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        // The default settings always carry a valid site_url
        match Settings::default().into_site_config() {
            Ok(config) => config,
            Err(e) => unreachable!("default settings are valid: {e}"),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn lowercase(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.to_ascii_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_partition() {
        let config = SiteConfig::default();
        for code in [666, 308, 400, 404, 408] {
            assert_eq!(config.classify(code), StatusType::Broken);
        }
        for code in [0, 413] {
            assert_eq!(config.classify(code), StatusType::Warning);
        }
        for code in [200, 301, 302, 500, 999] {
            assert_eq!(config.classify(code), StatusType::Good);
        }
    }

    #[test]
    fn test_warnings_disabled_fall_back_to_good() {
        let config = Settings {
            warnings_enabled: false,
            ..Settings::default()
        }
        .into_site_config()
        .unwrap();
        assert_eq!(config.classify(0), StatusType::Good);
        assert_eq!(config.classify(413), StatusType::Good);
        assert_eq!(config.classify(404), StatusType::Broken);
    }

    #[test]
    fn test_broken_wins_over_warning() {
        let config = Settings {
            bad_codes: vec![500],
            warning_codes: vec![500],
            ..Settings::default()
        }
        .into_site_config()
        .unwrap();
        assert_eq!(config.classify(500), StatusType::Broken);
    }

    #[test]
    fn test_site_config_normalizes_site_url() {
        let config = Settings {
            site_url: "https://example.com/".to_string(),
            ..Settings::default()
        }
        .into_site_config()
        .unwrap();
        assert_eq!(config.site_url, "https://example.com");
        assert_eq!(config.current_scheme, "https");
        assert!(config.user_agent.ends_with("; https://example.com"));
    }

    #[test]
    fn test_invalid_site_url_is_rejected() {
        let result = Settings {
            site_url: "ftp://example.com".to_string(),
            ..Settings::default()
        }
        .into_site_config();
        assert!(matches!(result, Err(SettingsError::InvalidSiteUrl(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "site_url = \"https://blog.example\"\ntimeout = 9\ncache_ttl_seconds = 3600\nbad_codes = [404, 410]\n\n[html_link_sources]\na = \"href\"\nimg = \"src\"\n",
        )
        .unwrap();

        let config = Settings::load(Some(&path))
            .unwrap()
            .into_site_config()
            .unwrap();
        assert_eq!(config.site_url, "https://blog.example");
        assert_eq!(config.timeout, Duration::from_secs(9));
        assert_eq!(config.cache_ttl_seconds, 3600);
        assert_eq!(config.classify(410), StatusType::Broken);
        assert_eq!(config.classify(308), StatusType::Good);
        assert_eq!(
            config.html_link_sources,
            vec![
                ("a".to_string(), "href".to_string()),
                ("img".to_string(), "src".to_string())
            ]
        );
    }
}
