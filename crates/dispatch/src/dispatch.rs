//! The notification dispatcher (§4.B): resolves contacts for a
//! notification group and fans out one rendered message per channel.

use std::collections::HashMap;

use tracing::warn;

use template_context::{build_context, RenderFlags, TemplateRenderer};
use ticket_store::{
    ChannelConfig, ChannelType, ContactStore, GroupStore, NotificationGroup, NotificationTemplate,
    Project, ProjectStore, Ticket, TemplateStore,
};

use crate::adapters::{EmailAdapter, FeishuAdapter, SlackAdapter, SmsAdapter};
use crate::adapter::TransportAdapter;
use crate::event::{DispatchEvent, CARD_META_KEY};
use crate::transport_config::TransportConfig;

/// Per-channel success map produced by one `send_to_group` call.
pub type DispatchResult = HashMap<String, bool>;

/// Resolve contacts, render the three artifacts, and fan out one message
/// per channel config in a group. Never raises to the caller — transport
/// errors become `false` entries; the caller is responsible for appending
/// timeline events and bumping counters (§4.B contract: "Does not mutate
/// the ticket").
#[allow(clippy::too_many_arguments)]
pub async fn send_to_group(
    ticket: &Ticket,
    group: &NotificationGroup,
    template: Option<&NotificationTemplate>,
    project: Option<&Project>,
    flags: RenderFlags,
    acknowledged_by_name: &str,
    base_url: &str,
    contacts: &dyn ContactStore,
    renderer: &dyn TemplateRenderer,
    transport: &TransportConfig,
) -> DispatchResult {
    let context = build_context(ticket, project, flags, None, acknowledged_by_name, base_url);
    let artifacts = match renderer.render(template, &context) {
        Ok(a) => a,
        Err(err) => {
            warn!(ticket_id = %ticket.id, error = %err, "template rendering failed, using built-in format");
            template_context::RenderedArtifacts::default()
        }
    };

    let mut meta: HashMap<String, serde_json::Value> = HashMap::new();
    meta.insert("ticket_id".into(), ticket.id.to_string().into());
    meta.insert("ack_token".into(), ticket.ack_token.clone().into());
    meta.insert("title".into(), ticket.title.clone().into());
    meta.insert("description".into(), ticket.description.clone().into());
    meta.insert("severity".into(), ticket.severity.clone().into());
    if let Some(card) = &artifacts.card {
        meta.insert(CARD_META_KEY.into(), card.clone());
    }

    let event = DispatchEvent {
        source: ticket.source.clone(),
        kind: "notification".to_string(),
        labels: ticket.labels.clone(),
        payload: ticket.payload.clone(),
        meta,
    };

    let mut results = DispatchResult::new();

    for config in &group.channel_configs {
        dispatch_channel(config, &event, &artifacts, contacts, transport, &mut results).await;
    }

    results
}

async fn dispatch_channel(
    config: &ChannelConfig,
    event: &DispatchEvent,
    artifacts: &template_context::RenderedArtifacts,
    contacts: &dyn ContactStore,
    transport: &TransportConfig,
    results: &mut DispatchResult,
) {
    let resolved = match contacts.find_many(&config.contact_ids).await {
        Ok(c) => c,
        Err(err) => {
            warn!(error = %err, "failed to resolve contacts for channel config");
            Vec::new()
        }
    };
    if resolved.len() < config.contact_ids.len() {
        warn!(
            requested = config.contact_ids.len(),
            resolved = resolved.len(),
            "some contact ids no longer resolve, skipping"
        );
    }

    match config.kind {
        ChannelType::Feishu => {
            let mut any = false;
            for contact in &resolved {
                if !contact.has_feishu() {
                    warn!(contact = %contact.name, "contact has no feishu webhook configured, skipping");
                    continue;
                }
                any = true;
                let adapter = FeishuAdapter::new(contact.feishu_webhook_url.clone());
                let label = format!("feishu:{}", contact.name);
                let ok = send_and_log(&adapter, event, &label).await;
                results.insert(label, ok);
            }
            if !any {
                warn!("feishu channel has zero usable contacts, omitting from result");
            }
        }
        ChannelType::Slack => {
            let mut any = false;
            for contact in &resolved {
                if !contact.has_slack() {
                    warn!(contact = %contact.name, "contact has no slack channel configured, skipping");
                    continue;
                }
                any = true;
                let adapter = SlackAdapter::new(contact.slack_channel_id.clone());
                let label = format!("slack:{}", contact.name);
                let ok = send_and_log(&adapter, event, &label).await;
                results.insert(label, ok);
            }
            if !any {
                warn!("slack channel has zero usable contacts, omitting from result");
            }
        }
        ChannelType::Email => {
            let all_emails: Vec<String> = resolved.iter().flat_map(|c| c.emails.clone()).collect();
            if all_emails.is_empty() {
                warn!("email channel has zero usable contacts, omitting from result");
                return;
            }
            let adapter = EmailAdapter::new(
                transport.resend_api_key.clone(),
                transport.resend_api_url.clone(),
                transport.resend_from_email.clone(),
                all_emails,
                artifacts.email.as_ref().map(|(s, _)| s.clone()),
                artifacts.email.as_ref().map(|(_, b)| b.clone()),
            );
            let ok = send_and_log(&adapter, event, "email").await;
            results.insert("email".to_string(), ok);
        }
        ChannelType::Sms => {
            let all_phones: Vec<String> = resolved.iter().flat_map(|c| c.phones.clone()).collect();
            if all_phones.is_empty() {
                warn!("sms channel has zero usable contacts, omitting from result");
                return;
            }
            let adapter = SmsAdapter::new(
                transport.twilio_account_sid.clone(),
                transport.twilio_auth_token.clone(),
                transport.twilio_from_number.clone(),
                all_phones,
                artifacts.sms.clone(),
                transport.twilio_api_base.clone(),
            );
            let ok = send_and_log(&adapter, event, "sms").await;
            results.insert("sms".to_string(), ok);
        }
    }
}

async fn send_and_log(adapter: &dyn TransportAdapter, event: &DispatchEvent, label: &str) -> bool {
    match adapter.send(event).await {
        Ok(()) => true,
        Err(err) => {
            warn!(channel = %label, error = %err, "notification send failed");
            false
        }
    }
}

/// Resolve the group at position `level - 1` in the ticket's project and
/// send with no special flags. Returns `{}` if the project or group is
/// absent, or the level exceeds the configured groups.
pub async fn notify_ticket(
    ticket: &Ticket,
    level: u32,
    projects: &dyn ProjectStore,
    groups: &dyn GroupStore,
    contacts: &dyn ContactStore,
    templates: &dyn TemplateStore,
    renderer: &dyn TemplateRenderer,
    transport: &TransportConfig,
    base_url: &str,
) -> DispatchResult {
    let Ok(Some(project)) = projects.get(ticket.project_id).await else {
        warn!(ticket_id = %ticket.id, "project not found, skipping notification");
        return DispatchResult::new();
    };

    let Some(group_id) = level
        .checked_sub(1)
        .and_then(|idx| project.notification_group_ids.get(idx as usize))
    else {
        warn!(ticket_id = %ticket.id, level, "escalation level has no configured group");
        return DispatchResult::new();
    };

    let Ok(Some(group)) = groups.get(*group_id).await else {
        warn!(ticket_id = %ticket.id, group_id = %group_id, "notification group not found");
        return DispatchResult::new();
    };

    let template = resolve_template(&project, templates).await;

    send_to_group(
        ticket,
        &group,
        template.as_ref(),
        Some(&project),
        RenderFlags::default(),
        "",
        base_url,
        contacts,
        renderer,
        transport,
    )
    .await
}

/// Iff the project has `notify_on_ack`, send to every group at positions
/// `0..escalation_level-1`, merging per-group results with an `L<level>:`
/// prefix.
#[allow(clippy::too_many_arguments)]
pub async fn notify_ticket_acknowledged(
    ticket: &Ticket,
    acknowledged_by_name: &str,
    projects: &dyn ProjectStore,
    groups: &dyn GroupStore,
    contacts: &dyn ContactStore,
    templates: &dyn TemplateStore,
    renderer: &dyn TemplateRenderer,
    transport: &TransportConfig,
    base_url: &str,
) -> DispatchResult {
    let Ok(Some(project)) = projects.get(ticket.project_id).await else {
        return DispatchResult::new();
    };
    if !project.notify_on_ack {
        return DispatchResult::new();
    }
    if project.notification_group_ids.is_empty() {
        return DispatchResult::new();
    }

    let template = resolve_template(&project, templates).await;
    let mut all_results = DispatchResult::new();

    for level in 1..=ticket.escalation_level {
        let idx = (level - 1) as usize;
        let Some(group_id) = project.notification_group_ids.get(idx) else {
            break;
        };
        let group = match groups.get(*group_id).await {
            Ok(Some(g)) => g,
            Ok(None) => {
                warn!(group_id = %group_id, "notification group not found, skipping level");
                continue;
            }
            Err(err) => {
                warn!(error = %err, "failed to load notification group");
                continue;
            }
        };

        let results = send_to_group(
            ticket,
            &group,
            template.as_ref(),
            Some(&project),
            RenderFlags {
                is_ack_notification: true,
                ..Default::default()
            },
            acknowledged_by_name,
            base_url,
            contacts,
            renderer,
            transport,
        )
        .await;

        for (key, value) in results {
            all_results.insert(format!("L{level}:{key}"), value);
        }
    }

    all_results
}

async fn resolve_template(
    project: &Project,
    templates: &dyn TemplateStore,
) -> Option<NotificationTemplate> {
    let template_id = project.notification_template_id?;
    match templates.get(template_id).await {
        Ok(template) => template,
        Err(err) => {
            warn!(error = %err, "failed to load notification template");
            None
        }
    }
}
