//! Notification groups: an ordered collection of channel configurations
//! sharing one escalation level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The transport kind a channel config binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Feishu,
    Email,
    Sms,
    Slack,
}

/// Binding of a transport kind to the contacts to be reached via it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default)]
    pub contact_ids: Vec<Uuid>,
}

/// An ordered collection of channel configurations sharing one escalation
/// level, plus an optional minimum repeat interval between notifications
/// at that level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationGroup {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Minimum minutes between successive notifications at this level.
    /// Absent means no repeats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_interval: Option<u32>,
    #[serde(default)]
    pub channel_configs: Vec<ChannelConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
