//! The project entity: the scope that owns tickets, groups, and escalation
//! policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-project escalation policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EscalationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u32,
}

fn default_timeout_minutes() -> u32 {
    15
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_minutes: default_timeout_minutes(),
        }
    }
}

/// A project groups tickets under one escalation policy and one ordered
/// list of notification groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub namespace_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notification_group_ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_template_id: Option<Uuid>,
    #[serde(default)]
    pub escalation_config: EscalationConfig,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub notify_on_ack: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silenced_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Project {
    /// Whether ingress should still create tickets but suppress all
    /// notifications for the project.
    #[must_use]
    pub fn is_silenced(&self) -> bool {
        self.silenced_until
            .is_some_and(|until| Utc::now() < until)
    }
}
