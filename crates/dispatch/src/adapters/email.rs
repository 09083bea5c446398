//! Email adapter. Batches every resolved address from a channel config into
//! one outbound call (§4.B.3).

use async_trait::async_trait;
use serde_json::json;
use ticket_store::ChannelType;
use tracing::{debug, warn};

use crate::adapter::TransportAdapter;
use crate::error::ChannelError;
use crate::event::DispatchEvent;

pub struct EmailAdapter {
    api_key: String,
    api_url: String,
    from_email: String,
    to: Vec<String>,
    subject_override: Option<String>,
    body_override: Option<String>,
    client: reqwest::Client,
}

impl EmailAdapter {
    #[must_use]
    pub fn new(
        api_key: String,
        api_url: String,
        from_email: String,
        to: Vec<String>,
        subject_override: Option<String>,
        body_override: Option<String>,
    ) -> Self {
        Self {
            api_key,
            api_url,
            from_email,
            to,
            subject_override,
            body_override,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TransportAdapter for EmailAdapter {
    fn kind(&self) -> ChannelType {
        ChannelType::Email
    }

    async fn send(&self, event: &DispatchEvent) -> Result<(), ChannelError> {
        if self.api_key.is_empty() || self.from_email.is_empty() {
            return Err(ChannelError::NotConfigured("email sender credentials".into()));
        }
        if self.to.is_empty() {
            return Err(ChannelError::NotConfigured("no email recipients".into()));
        }

        let subject = self
            .subject_override
            .clone()
            .unwrap_or_else(|| format!("[{}] {}", event.source, event.meta_str("title").unwrap_or("Alert")));
        let body = self
            .body_override
            .clone()
            .unwrap_or_else(|| event.meta_str("description").unwrap_or("").to_string());

        let payload = json!({
            "from": self.from_email,
            "to": self.to,
            "subject": subject,
            "html": body,
        });

        debug!(channel = "email", recipients = self.to.len(), "sending notification");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(channel = "email", %status, %body, "email send failed");
            return Err(ChannelError::Other(format!("email provider returned {status}: {body}")));
        }

        Ok(())
    }
}
