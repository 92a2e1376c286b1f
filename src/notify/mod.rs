// src/notify/mod.rs
// =============================================================================
// Notification of flagged links.
//
// A scan hands every channel one batch: the source page plus its flagged
// links. Each link says whether it was already on record, because the chat
// channels only speak up about broken links nobody has been told about yet.
//
// Channels:
// - LogNotifier: always on, writes the batch to the log
// - WebhookNotifier: POSTs the batch as JSON (Discord / Teams relays)
// - NotifierSet: fans a batch out; a failing channel is logged, never fatal
// =============================================================================

mod webhook;

pub use webhook::WebhookNotifier;

use std::sync::Arc;

use async_trait::async_trait;
use log::{error, info, warn};
use serde::Serialize;

use crate::checker::{Location, StatusRecord, StatusType};
use crate::config::SiteConfig;
use crate::error::NotifyError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlaggedLink {
    pub location: Location,
    #[serde(flatten)]
    pub status: StatusRecord,
    /// A result for this link existed before this scan
    pub previously_flagged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyBatch {
    pub source_url: String,
    pub flagged: Vec<FlaggedLink>,
}

impl NotifyBatch {
    pub fn is_empty(&self) -> bool {
        self.flagged.is_empty()
    }

    /// Broken links that were not on record before this scan.
    pub fn new_broken(&self) -> impl Iterator<Item = &FlaggedLink> {
        self.flagged
            .iter()
            .filter(|f| f.status.status_type == StatusType::Broken && !f.previously_flagged)
    }

    pub fn count(&self, status_type: StatusType) -> usize {
        self.flagged
            .iter()
            .filter(|f| f.status.status_type == status_type)
            .count()
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name used in logs
    fn name(&self) -> &str;
    async fn notify(&self, batch: &NotifyBatch) -> Result<(), NotifyError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, batch: &NotifyBatch) -> Result<(), NotifyError> {
        info!(
            "{} flagged link(s) on {} ({} broken, {} warning)",
            batch.flagged.len(),
            batch.source_url,
            batch.count(StatusType::Broken),
            batch.count(StatusType::Warning)
        );
        for link in &batch.flagged {
            warn!(
                "  [{}] {} {} {} ({})",
                link.location.as_str(),
                link.status.status_type,
                link.status.code,
                link.status.link,
                link.status.text
            );
        }
        Ok(())
    }
}

/// Every configured channel.
#[derive(Clone, Default)]
pub struct NotifierSet {
    channels: Vec<Arc<dyn Notifier>>,
}

impl NotifierSet {
    pub fn new(channels: Vec<Arc<dyn Notifier>>) -> Self {
        Self { channels }
    }

    /// The log channel plus one webhook channel per configured webhook.
    pub fn from_config(config: &SiteConfig) -> Result<Self, NotifyError> {
        let mut channels: Vec<Arc<dyn Notifier>> = vec![Arc::new(LogNotifier)];
        for webhook in &config.webhooks {
            channels.push(Arc::new(WebhookNotifier::new(&webhook.name, &webhook.url)?));
        }
        Ok(Self { channels })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    // Sends the batch to every channel. Returns how many channels failed.
    pub async fn notify(&self, batch: &NotifyBatch) -> usize {
        let mut failures = 0;
        for channel in &self.channels {
            if let Err(e) = channel.notify(batch).await {
                error!("Notification via {} failed: {}", channel.name(), e);
                failures += 1;
            }
        }
        failures
    }
}
