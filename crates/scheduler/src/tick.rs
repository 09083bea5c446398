//! The per-tick algorithm: load eligible projects, sweep their active
//! tickets, and apply the repeat/escalate/max-level decision table.
//!
//! An unexpected error on one ticket is logged and never aborts the sweep —
//! the tick always continues to the next ticket, and ticks never overlap
//! (the caller awaits one tick to completion before scheduling the next).

use chrono::{Duration as ChronoDuration, Utc};
use tracing::{error, warn};

use dispatch::send_to_group;
use template_context::RenderFlags;
use ticket_store::{EventType, NotificationGroup, NotificationTemplate, Project, Ticket, TicketStatus};

use crate::deps::SchedulerDeps;

async fn resolve_template(deps: &SchedulerDeps, project: &Project) -> Option<NotificationTemplate> {
    let template_id = project.notification_template_id?;
    match deps.templates.get(template_id).await {
        Ok(template) => template,
        Err(err) => {
            warn!(error = %err, "failed to load notification template during tick");
            None
        }
    }
}

/// Run one full sweep. Never panics; individual ticket failures are logged
/// and skipped.
pub async fn run_once(deps: &SchedulerDeps) {
    let projects = match deps.projects.find_enabled_active().await {
        Ok(projects) => projects,
        Err(err) => {
            error!(error = %err, "failed to load enabled/active projects, skipping tick");
            return;
        }
    };

    for project in &projects {
        if project.is_silenced() {
            continue;
        }
        sweep_project(deps, project).await;
    }
}

async fn sweep_project(deps: &SchedulerDeps, project: &Project) {
    let tickets = match deps
        .tickets
        .find_by_project_and_status(project.id, &[TicketStatus::Pending, TicketStatus::Escalated])
        .await
    {
        Ok(tickets) => tickets,
        Err(err) => {
            error!(project_id = %project.id, error = %err, "failed to load project tickets, skipping project");
            return;
        }
    };

    for ticket in tickets {
        if let Err(err) = sweep_ticket(deps, project, ticket).await {
            error!(error = %err, "error processing ticket during scheduler tick, continuing sweep");
        }
    }
}

async fn sweep_ticket(
    deps: &SchedulerDeps,
    project: &Project,
    mut ticket: Ticket,
) -> Result<(), ticket_store::StoreError> {
    if !ticket.can_escalate() {
        return Ok(());
    }

    let Some(idx) = (ticket.escalation_level as usize).checked_sub(1) else {
        return Ok(());
    };
    let Some(group_id) = project.notification_group_ids.get(idx) else {
        return Ok(());
    };
    let Some(group) = deps.groups.get(*group_id).await? else {
        warn!(ticket_id = %ticket.id, group_id = %group_id, "current notification group missing, skipping");
        return Ok(());
    };

    let now = Utc::now();
    let last = ticket.last_notified_at.unwrap_or(ticket.created_at);
    let delta = now.signed_duration_since(last);
    let timeout = ChronoDuration::minutes(i64::from(project.escalation_config.timeout_minutes));
    let repeat = group
        .repeat_interval
        .map(|minutes| ChronoDuration::minutes(i64::from(minutes)));
    let at_max_level = idx + 1 >= project.notification_group_ids.len();

    if let Some(r) = repeat {
        if delta < timeout && delta >= r {
            return repeat_at(deps, project, &group, &mut ticket, now).await;
        }
    }

    if delta < timeout {
        return Ok(());
    }

    if !at_max_level {
        return escalate(deps, project, idx, &mut ticket, now).await;
    }

    if let Some(r) = repeat {
        if delta >= r {
            return repeat_at(deps, project, &group, &mut ticket, now).await;
        }
        return Ok(());
    }

    let already_reached = ticket
        .events
        .iter()
        .any(|e| e.kind == EventType::MaxLevelReached);
    if already_reached {
        return Ok(());
    }

    ticket.add_event(
        EventType::MaxLevelReached,
        Some(ticket.escalation_level),
        Some(group.name.clone()),
        None,
        "ticket reached the last configured notification group",
    );
    ticket.updated_at = now;
    deps.tickets.save(&ticket).await
}

async fn repeat_at(
    deps: &SchedulerDeps,
    project: &Project,
    group: &NotificationGroup,
    ticket: &mut Ticket,
    now: chrono::DateTime<Utc>,
) -> Result<(), ticket_store::StoreError> {
    let template = resolve_template(deps, project).await;
    let results = send_to_group(
        ticket,
        group,
        template.as_ref(),
        Some(project),
        RenderFlags {
            is_repeated: true,
            ..Default::default()
        },
        "",
        &deps.base_url,
        deps.contacts.as_ref(),
        deps.renderer.as_ref(),
        &deps.transport,
    )
    .await;
    let success = results.values().any(|ok| *ok);

    ticket.add_event(
        EventType::Repeated,
        Some(ticket.escalation_level),
        Some(group.name.clone()),
        Some(success),
        "repeat notification sent at current escalation level",
    );
    ticket.last_notified_at = Some(now);
    ticket.notification_count += 1;
    ticket.updated_at = now;
    deps.tickets.save(ticket).await
}

/// Escalates `ticket` to the group at `current_idx + 1`. Status and level
/// are set *before* dispatch runs, so the rendered message reflects the new
/// level (§9 design note on crash semantics: if the process dies between
/// this and the save below, the next tick simply re-evaluates from the
/// persisted state — which may already be ahead of what was notified).
async fn escalate(
    deps: &SchedulerDeps,
    project: &Project,
    current_idx: usize,
    ticket: &mut Ticket,
    now: chrono::DateTime<Utc>,
) -> Result<(), ticket_store::StoreError> {
    let next_idx = current_idx + 1;
    let Some(next_group_id) = project.notification_group_ids.get(next_idx) else {
        return Ok(());
    };
    let Some(next_group) = deps.groups.get(*next_group_id).await? else {
        warn!(ticket_id = %ticket.id, group_id = %next_group_id, "next notification group missing, skipping escalation");
        return Ok(());
    };

    ticket.status = TicketStatus::Escalated;
    ticket.escalation_level = u32::try_from(next_idx).unwrap_or(u32::MAX) + 1;

    let template = resolve_template(deps, project).await;
    let results = send_to_group(
        ticket,
        &next_group,
        template.as_ref(),
        Some(project),
        RenderFlags {
            is_escalated: true,
            ..Default::default()
        },
        "",
        &deps.base_url,
        deps.contacts.as_ref(),
        deps.renderer.as_ref(),
        &deps.transport,
    )
    .await;
    let success = results.values().any(|ok| *ok);

    ticket.add_event(
        EventType::Escalated,
        Some(ticket.escalation_level),
        Some(next_group.name.clone()),
        Some(success),
        "ticket escalated to the next notification group",
    );
    ticket.last_notified_at = Some(now);
    ticket.notification_count += 1;
    ticket.updated_at = now;
    deps.tickets.save(ticket).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use template_context::HandlebarsRenderer;
    use ticket_store::{ChannelConfig, ChannelType, EscalationConfig, InMemoryStore};
    use uuid::Uuid;

    fn deps(store: &InMemoryStore) -> SchedulerDeps {
        SchedulerDeps {
            projects: Arc::new(store.clone()),
            groups: Arc::new(store.clone()),
            tickets: Arc::new(store.clone()),
            contacts: Arc::new(store.clone()),
            templates: Arc::new(store.clone()),
            renderer: Arc::new(HandlebarsRenderer::new()),
            transport: dispatch::TransportConfig::default(),
            base_url: "https://relay.example.com".to_string(),
        }
    }

    fn group(repeat_interval: Option<u32>) -> NotificationGroup {
        let now = Utc::now();
        NotificationGroup {
            id: Uuid::new_v4(),
            name: "on-call".to_string(),
            description: String::new(),
            repeat_interval,
            channel_configs: vec![ChannelConfig {
                kind: ChannelType::Email,
                contact_ids: vec![],
            }],
            created_at: now,
            updated_at: now,
        }
    }

    fn project_with_groups(group_ids: Vec<Uuid>, timeout_minutes: u32) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            namespace_id: Uuid::new_v4(),
            name: "payments".to_string(),
            description: String::new(),
            notification_group_ids: group_ids,
            notification_template_id: None,
            escalation_config: EscalationConfig {
                enabled: true,
                timeout_minutes,
            },
            is_active: true,
            notify_on_ack: false,
            silenced_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn ticket_aged(project_id: Uuid, severity: &str, minutes_ago: i64) -> Ticket {
        let mut t = Ticket::new(
            project_id,
            "custom",
            serde_json::json!({}),
            None,
            HashMap::new(),
            "disk full",
            "95% used",
            severity,
        );
        let aged = Utc::now() - ChronoDuration::minutes(minutes_ago);
        t.created_at = aged;
        t.last_notified_at = Some(aged);
        t
    }

    #[tokio::test]
    async fn escalates_critical_ticket_past_timeout() {
        let store = InMemoryStore::new();
        let g1 = group(None);
        let g2 = group(None);
        ticket_store::GroupStore::insert(&store, &g1).await.unwrap();
        ticket_store::GroupStore::insert(&store, &g2).await.unwrap();
        let project = project_with_groups(vec![g1.id, g2.id], 1);
        ticket_store::ProjectStore::insert(&store, &project).await.unwrap();
        let ticket = ticket_aged(project.id, "critical", 2);
        ticket_store::TicketStore::insert(&store, &ticket).await.unwrap();

        run_once(&deps(&store)).await;

        let saved = ticket_store::TicketStore::get(&store, ticket.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.status, TicketStatus::Escalated);
        assert_eq!(saved.escalation_level, 2);
        assert_eq!(saved.notification_count, 1);
        assert!(saved
            .events
            .iter()
            .any(|e| e.kind == EventType::Escalated));
    }

    #[tokio::test]
    async fn skips_non_critical_ticket() {
        let store = InMemoryStore::new();
        let g1 = group(None);
        ticket_store::GroupStore::insert(&store, &g1).await.unwrap();
        let project = project_with_groups(vec![g1.id], 1);
        ticket_store::ProjectStore::insert(&store, &project).await.unwrap();
        let ticket = ticket_aged(project.id, "warning", 2);
        ticket_store::TicketStore::insert(&store, &ticket).await.unwrap();

        run_once(&deps(&store)).await;

        let saved = ticket_store::TicketStore::get(&store, ticket.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.status, TicketStatus::Pending);
        assert_eq!(saved.escalation_level, 1);
        assert!(saved.events.is_empty());
    }

    #[tokio::test]
    async fn repeats_before_timeout_when_repeat_interval_elapsed() {
        let store = InMemoryStore::new();
        let g1 = group(Some(1));
        ticket_store::GroupStore::insert(&store, &g1).await.unwrap();
        let project = project_with_groups(vec![g1.id], 5);
        ticket_store::ProjectStore::insert(&store, &project).await.unwrap();
        let ticket = ticket_aged(project.id, "critical", 2);
        ticket_store::TicketStore::insert(&store, &ticket).await.unwrap();

        run_once(&deps(&store)).await;

        let saved = ticket_store::TicketStore::get(&store, ticket.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.status, TicketStatus::Pending);
        assert_eq!(saved.escalation_level, 1);
        assert_eq!(saved.notification_count, 1);
        assert!(saved.events.iter().any(|e| e.kind == EventType::Repeated));
    }

    #[tokio::test]
    async fn records_max_level_reached_once() {
        let store = InMemoryStore::new();
        let g1 = group(None);
        ticket_store::GroupStore::insert(&store, &g1).await.unwrap();
        let project = project_with_groups(vec![g1.id], 1);
        ticket_store::ProjectStore::insert(&store, &project).await.unwrap();
        let ticket = ticket_aged(project.id, "critical", 2);
        ticket_store::TicketStore::insert(&store, &ticket).await.unwrap();

        let d = deps(&store);
        run_once(&d).await;
        run_once(&d).await;

        let saved = ticket_store::TicketStore::get(&store, ticket.id)
            .await
            .unwrap()
            .unwrap();
        let max_level_events = saved
            .events
            .iter()
            .filter(|e| e.kind == EventType::MaxLevelReached)
            .count();
        assert_eq!(max_level_events, 1);
    }

    #[tokio::test]
    async fn does_nothing_before_timeout_with_no_repeat_interval() {
        let store = InMemoryStore::new();
        let g1 = group(None);
        ticket_store::GroupStore::insert(&store, &g1).await.unwrap();
        let project = project_with_groups(vec![g1.id], 30);
        ticket_store::ProjectStore::insert(&store, &project).await.unwrap();
        let ticket = ticket_aged(project.id, "critical", 1);
        ticket_store::TicketStore::insert(&store, &ticket).await.unwrap();

        run_once(&deps(&store)).await;

        let saved = ticket_store::TicketStore::get(&store, ticket.id)
            .await
            .unwrap()
            .unwrap();
        assert!(saved.events.is_empty());
        assert_eq!(saved.notification_count, 0);
    }
}
