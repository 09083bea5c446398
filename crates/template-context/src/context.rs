//! Pure, side-effect-free rendering context builder (§4.C).

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use ticket_store::{Project, Ticket};

/// Dict-shaped projection of a ticket, as exposed to templates.
#[derive(Debug, Clone, Serialize)]
pub struct TicketProjection {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: String,
    pub source: String,
    pub status: String,
    pub labels: HashMap<String, String>,
    pub escalation_level: u32,
    pub notification_count: u64,
    /// ISO-8601.
    pub created_at: String,
}

/// Minimal projection of a project, included when one is supplied.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectProjection {
    pub id: String,
    pub name: String,
}

/// The full rendering context consumed by the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    pub ticket: TicketProjection,
    pub payload: Value,
    pub parsed: Value,
    pub source: String,
    pub ack_url: String,
    pub detail_url: String,
    pub is_escalated: bool,
    pub is_repeated: bool,
    pub notification_count: u64,
    pub notification_label: String,
    pub is_ack_notification: bool,
    pub acknowledged_by_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectProjection>,
}

/// Flags controlling the `notification_label` computed in a context (§4.C).
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderFlags {
    pub is_escalated: bool,
    pub is_repeated: bool,
    pub is_ack_notification: bool,
}

/// Build the rendering context for one notification send.
///
/// `notification_count` defaults to `ticket.notification_count + 1` when not
/// explicitly supplied — the dispatcher always passes the *next* count so
/// the rendered message reflects the notification about to be sent.
#[must_use]
pub fn build_context(
    ticket: &Ticket,
    project: Option<&Project>,
    flags: RenderFlags,
    notification_count: Option<u64>,
    acknowledged_by_name: &str,
    base_url: &str,
) -> RenderContext {
    let base_url = base_url.trim_end_matches('/');
    let count = notification_count.unwrap_or(ticket.notification_count + 1);

    let notification_label = if flags.is_ack_notification {
        if acknowledged_by_name.is_empty() {
            "已确认".to_string()
        } else {
            format!("已确认 by {acknowledged_by_name}")
        }
    } else if flags.is_escalated {
        format!("已升级到 L{}", ticket.escalation_level)
    } else if flags.is_repeated || count > 1 {
        format!("第{count}次通知")
    } else {
        String::new()
    };

    let ticket_id = ticket.id.to_string();
    let ack_url = format!("{base_url}/ack/{ticket_id}?token={}", ticket.ack_token);
    let detail_url = format!("{base_url}/tickets/{ticket_id}");

    RenderContext {
        ticket: TicketProjection {
            id: ticket_id,
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            severity: ticket.severity.clone(),
            source: ticket.source.clone(),
            status: ticket.status.as_str().to_string(),
            labels: ticket.labels.clone(),
            escalation_level: ticket.escalation_level,
            notification_count: count,
            created_at: ticket.created_at.to_rfc3339(),
        },
        payload: ticket.payload.clone(),
        parsed: ticket.parsed_data.clone().unwrap_or(Value::Object(serde_json::Map::new())),
        source: ticket.source.clone(),
        ack_url,
        detail_url,
        is_escalated: flags.is_escalated,
        is_repeated: flags.is_repeated,
        notification_count: count,
        notification_label,
        is_ack_notification: flags.is_ack_notification,
        acknowledged_by_name: acknowledged_by_name.to_string(),
        project: project.map(|p| ProjectProjection {
            id: p.id.to_string(),
            name: p.name.clone(),
        }),
    }
}
