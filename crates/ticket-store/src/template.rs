//! The notification template record.
//!
//! Rendering the template body against a context is out of scope for this
//! crate (see `template-context`); this record carries the Handlebars
//! source strings a renderer needs, without any template-authoring CRUD.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationTemplate {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    /// Handlebars source producing a Feishu/Slack-style structured card, as
    /// a JSON document once rendered.
    #[serde(default)]
    pub card_template: Option<String>,
    #[serde(default)]
    pub email_subject_template: Option<String>,
    #[serde(default)]
    pub email_body_template: Option<String>,
    #[serde(default)]
    pub sms_template: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
