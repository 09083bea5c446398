//! Contacts: the people reachable through one or more channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reachable person. A contact is usable for a given channel type iff it
/// has the corresponding address populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub feishu_webhook_url: String,
    #[serde(default)]
    pub slack_channel_id: String,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    #[must_use]
    pub fn has_feishu(&self) -> bool {
        !self.feishu_webhook_url.is_empty()
    }

    #[must_use]
    pub fn has_slack(&self) -> bool {
        !self.slack_channel_id.is_empty()
    }

    #[must_use]
    pub fn has_email(&self) -> bool {
        !self.emails.is_empty()
    }

    #[must_use]
    pub fn has_phone(&self) -> bool {
        !self.phones.is_empty()
    }
}
