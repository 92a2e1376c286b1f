// src/notify/webhook.rs
// =============================================================================
// Webhook channel: POSTs the batch as JSON to a relay URL.
//
// The body is the NotifyBatch itself. Chat services (Discord, Teams) need
// a relay in between that turns it into their message format.
//
// Only batches containing at least one new broken link are sent. Warnings
// and links already on record stay in the log and the result list.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use super::{Notifier, NotifyBatch};
use crate::error::NotifyError;

pub struct WebhookNotifier {
    name: String,
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(name: &str, url: &str) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            name: name.to_string(),
            url: url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, batch: &NotifyBatch) -> Result<(), NotifyError> {
        if batch.new_broken().next().is_none() {
            debug!("{}: no new broken links on {}, not sending", self.name, batch.source_url);
            return Ok(());
        }

        let response = self.client.post(&self.url).json(batch).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                channel: self.name.clone(),
                status: status.as_u16(),
            });
        }

        debug!("{}: delivered batch for {}", self.name, batch.source_url);
        Ok(())
    }
}
