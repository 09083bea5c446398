//! Feishu (Lark) incoming-webhook adapter.

use async_trait::async_trait;
use serde_json::{json, Value};
use ticket_store::ChannelType;
use tracing::{debug, warn};

use crate::adapter::TransportAdapter;
use crate::error::ChannelError;
use crate::event::{DispatchEvent, CARD_META_KEY};

/// One Feishu webhook bot, addressed by a single contact's webhook URL.
pub struct FeishuAdapter {
    webhook_url: String,
    client: reqwest::Client,
}

impl FeishuAdapter {
    #[must_use]
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    fn build_message(event: &DispatchEvent) -> Value {
        if let Some(card) = event.meta.get(CARD_META_KEY) {
            return json!({ "msg_type": "interactive", "card": card });
        }

        let title = event
            .meta_str("title")
            .unwrap_or("Alert")
            .to_string();
        let text = format!(
            "[{}] {}\n{}",
            event.source.to_uppercase(),
            title,
            event.meta_str("description").unwrap_or("")
        );
        json!({ "msg_type": "text", "content": { "text": text } })
    }
}

#[async_trait]
impl TransportAdapter for FeishuAdapter {
    fn kind(&self) -> ChannelType {
        ChannelType::Feishu
    }

    async fn send(&self, event: &DispatchEvent) -> Result<(), ChannelError> {
        if self.webhook_url.is_empty() {
            return Err(ChannelError::NotConfigured("feishu webhook url".into()));
        }

        let message = Self::build_message(event);
        debug!(channel = "feishu", "sending notification");

        let response = self.client.post(&self.webhook_url).json(&message).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(channel = "feishu", %status, %body, "feishu webhook request failed");
            return Err(ChannelError::Other(format!("feishu returned {status}: {body}")));
        }

        let result: Value = response.json().await.unwrap_or(Value::Null);
        if result.get("code").and_then(Value::as_i64) != Some(0) {
            warn!(channel = "feishu", ?result, "feishu api error");
            return Err(ChannelError::Other(format!("feishu api error: {result}")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> DispatchEvent {
        let mut meta = HashMap::new();
        meta.insert("title".to_string(), json!("disk full"));
        meta.insert("description".to_string(), json!("95% used"));
        DispatchEvent {
            source: "custom".to_string(),
            kind: "notification".to_string(),
            labels: HashMap::new(),
            payload: json!({}),
            meta,
        }
    }

    #[tokio::test]
    async fn send_succeeds_on_code_zero() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
            .mount(&server)
            .await;

        let adapter = FeishuAdapter::new(format!("{}/hook", server.uri()));
        adapter.send(&event()).await.unwrap();
    }

    #[tokio::test]
    async fn send_fails_on_nonzero_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 1, "msg": "bad"})))
            .mount(&server)
            .await;

        let adapter = FeishuAdapter::new(format!("{}/hook", server.uri()));
        assert!(adapter.send(&event()).await.is_err());
    }

    #[tokio::test]
    async fn send_rejects_unconfigured_adapter() {
        let adapter = FeishuAdapter::new(String::new());
        assert!(matches!(
            adapter.send(&event()).await,
            Err(ChannelError::NotConfigured(_))
        ));
    }
}
