//! SMS adapter. Batches every resolved phone number from a channel config
//! into one outbound call per recipient (§4.B.3 — the channel config is
//! still treated as one logical send; individual provider calls per
//! number are an implementation detail of the adapter).

use async_trait::async_trait;
use ticket_store::ChannelType;
use tracing::{debug, warn};

use crate::adapter::TransportAdapter;
use crate::error::ChannelError;
use crate::event::DispatchEvent;

pub struct SmsAdapter {
    account_sid: String,
    auth_token: String,
    from_number: String,
    to: Vec<String>,
    message_override: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl SmsAdapter {
    #[must_use]
    pub fn new(
        account_sid: String,
        auth_token: String,
        from_number: String,
        to: Vec<String>,
        message_override: Option<String>,
        api_base: String,
    ) -> Self {
        Self {
            account_sid,
            auth_token,
            from_number,
            to,
            message_override,
            api_base,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TransportAdapter for SmsAdapter {
    fn kind(&self) -> ChannelType {
        ChannelType::Sms
    }

    async fn send(&self, event: &DispatchEvent) -> Result<(), ChannelError> {
        if self.account_sid.is_empty() || self.auth_token.is_empty() || self.from_number.is_empty() {
            return Err(ChannelError::NotConfigured("twilio credentials".into()));
        }
        if self.to.is_empty() {
            return Err(ChannelError::NotConfigured("no sms recipients".into()));
        }

        let message = self
            .message_override
            .clone()
            .unwrap_or_else(|| format!("[{}] {}", event.source, event.meta_str("title").unwrap_or("Alert")));

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        );

        for to in &self.to {
            let params = [
                ("To", to.as_str()),
                ("From", self.from_number.as_str()),
                ("Body", message.as_str()),
            ];

            debug!(channel = "sms", to = %to, "sending notification");

            let response = self
                .client
                .post(&url)
                .basic_auth(&self.account_sid, Some(&self.auth_token))
                .form(&params)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(channel = "sms", %status, %body, to = %to, "sms send failed");
                return Err(ChannelError::Other(format!("twilio returned {status}: {body}")));
            }
        }

        Ok(())
    }
}
