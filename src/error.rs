// src/error.rs
// =============================================================================
// Typed errors for the layers that talk to something outside the process:
// the SQLite stores, the settings loader, the notification channels and the
// static-site content directory.
//
// The link classifier itself has no error type. Every failure there is folded
// into a StatusRecord, so a single bad link can never abort a scan.
// =============================================================================

use thiserror::Error;

/// Errors raised by the cache, result and omission stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQL execution error.
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    /// An in-memory store lock was poisoned by a panicking writer.
    #[error("{0} store lock poisoned")]
    Poisoned(&'static str),
}

/// Errors raised while loading settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The layered configuration could not be read or deserialized.
    #[error("Failed to load settings: {0}")]
    Load(#[from] ::config::ConfigError),

    /// `site_url` is not an absolute http(s) URL.
    #[error("Invalid site_url '{0}': expected an absolute http(s) URL")]
    InvalidSiteUrl(String),
}

/// Errors raised by a notification channel.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The webhook request could not be sent.
    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook answered with a non-success status.
    #[error("{channel} webhook rejected the payload with HTTP {status}")]
    Rejected { channel: String, status: u16 },
}

/// Errors raised by a source content backend.
#[derive(Error, Debug)]
pub enum ContentError {
    /// The source page does not exist in the content backend.
    #[error("Source not found: {0}")]
    Missing(String),

    /// Reading or writing the source file failed.
    #[error("Content I/O error: {0}")]
    Io(#[from] std::io::Error),
}
