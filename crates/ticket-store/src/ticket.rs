//! The ticket entity and its state machine.

use std::collections::HashMap;

use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Minimum entropy, in bytes, required of a freshly generated ack token.
const ACK_TOKEN_BYTES: usize = 32;

/// A ticket's position in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Created but deliberately excluded from scheduler action by a source
    /// adapter; terminal and non-actionable.
    Ignored,
    /// Awaiting acknowledgement or escalation.
    Pending,
    /// Closed via the acknowledgement gateway.
    Acknowledged,
    /// Escalated past its original notification group.
    Escalated,
    /// Closed by an inbound `resolved` alert.
    Resolved,
}

impl TicketStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Pending => "pending",
            Self::Acknowledged => "acknowledged",
            Self::Escalated => "escalated",
            Self::Resolved => "resolved",
        }
    }
}

/// The kind of change recorded in a ticket's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Created,
    Notified,
    NotifiedSilenced,
    Repeated,
    Escalated,
    MaxLevelReached,
    Acknowledged,
    Resolved,
}

/// A single append-only timeline entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketEvent {
    #[serde(rename = "type")]
    pub kind: EventType,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default)]
    pub details: String,
}

/// Durable record of one alert occurrence and its handling.
///
/// `Ticket` is the sole entity in this system with a state machine; every
/// other entity is configuration the scheduler and dispatcher read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub project_id: Uuid,
    pub source: String,
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_data: Option<Value>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: String,
    pub ack_token: String,
    pub status: TicketStatus,
    pub escalation_level: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_notified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notification_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub events: Vec<TicketEvent>,
}

impl Ticket {
    /// Generate a fresh, URL-safe ack token with at least 32 bytes of entropy.
    ///
    /// Tokens are generated once at creation and never rotated (§3 invariant 7).
    #[must_use]
    pub fn generate_ack_token() -> String {
        let mut bytes = [0u8; ACK_TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Build a new pending ticket at escalation level 1, as the intake
    /// adapter does on every inbound non-resolved alert.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        project_id: Uuid,
        source: impl Into<String>,
        payload: Value,
        parsed_data: Option<Value>,
        labels: HashMap<String, String>,
        title: impl Into<String>,
        description: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            source: source.into(),
            payload,
            parsed_data,
            labels,
            title: title.into(),
            description: description.into(),
            severity: severity.into(),
            ack_token: Self::generate_ack_token(),
            status: TicketStatus::Pending,
            escalation_level: 1,
            last_notified_at: None,
            notification_count: 0,
            acknowledged_at: None,
            acknowledged_by: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == TicketStatus::Pending
    }

    #[must_use]
    pub fn is_acknowledged(&self) -> bool {
        self.status == TicketStatus::Acknowledged
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == TicketStatus::Resolved
    }

    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.status == TicketStatus::Ignored
    }

    /// Whether the scheduler may escalate or repeat-notify this ticket on its
    /// next eligible tick.
    ///
    /// The severity gate restricts escalation *and* repeat to `critical`
    /// tickets only, mirroring the source system's current (possibly
    /// unintended) behavior — see the design notes on this.
    #[must_use]
    pub fn can_escalate(&self) -> bool {
        let status_ok = matches!(self.status, TicketStatus::Pending | TicketStatus::Escalated);
        status_ok && !self.severity.is_empty() && self.severity.eq_ignore_ascii_case("critical")
    }

    /// Append a timeline entry. Events are append-only and carry a
    /// monotonically non-decreasing timestamp.
    pub fn add_event(
        &mut self,
        kind: EventType,
        level: Option<u32>,
        group_name: Option<String>,
        success: Option<bool>,
        details: impl Into<String>,
    ) {
        self.events.push(TicketEvent {
            kind,
            timestamp: Utc::now(),
            level,
            group_name,
            success,
            details: details.into(),
        });
    }
}
