//! Slack incoming-webhook adapter.

use async_trait::async_trait;
use serde_json::{json, Value};
use ticket_store::ChannelType;
use tracing::{debug, warn};

use crate::adapter::TransportAdapter;
use crate::error::ChannelError;
use crate::event::DispatchEvent;

/// One Slack webhook, addressed by a single contact's channel address.
pub struct SlackAdapter {
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackAdapter {
    #[must_use]
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    fn build_message(event: &DispatchEvent) -> Value {
        let title = event.meta_str("title").unwrap_or("Alert");
        let text = format!(
            "*[{}]* {}\n{}",
            event.source.to_uppercase(),
            title,
            event.meta_str("description").unwrap_or("")
        );
        json!({ "text": text })
    }
}

#[async_trait]
impl TransportAdapter for SlackAdapter {
    fn kind(&self) -> ChannelType {
        ChannelType::Slack
    }

    async fn send(&self, event: &DispatchEvent) -> Result<(), ChannelError> {
        if self.webhook_url.is_empty() {
            return Err(ChannelError::NotConfigured("slack webhook url".into()));
        }

        let message = Self::build_message(event);
        debug!(channel = "slack", "sending notification");

        let response = self.client.post(&self.webhook_url).json(&message).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(channel = "slack", %status, %body, "slack webhook request failed");
            return Err(ChannelError::Other(format!("slack returned {status}: {body}")));
        }

        let body = response.text().await.unwrap_or_default();
        if body != "ok" {
            warn!(channel = "slack", %body, "slack webhook error");
            return Err(ChannelError::Other(format!("slack webhook error: {body}")));
        }

        Ok(())
    }
}
