//! Webhook intake (§4.F / §6): `POST /webhook/{namespace_slug}/{project_id}`.
//!
//! Generic field extraction only — vendor-specific payload parsers
//! (Alertmanager, Grafana, ...) are out of scope here.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use dispatch::notify_ticket;
use ticket_store::{EventType, Ticket, TicketStatus};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "custom".to_string()
}

fn extract_str(payload: &Value, keys: &[&str]) -> String {
    for key in keys {
        if let Some(value) = payload.get(*key).and_then(Value::as_str) {
            return value.to_string();
        }
    }
    String::new()
}

fn extract_labels(payload: &Value) -> std::collections::HashMap<String, String> {
    payload
        .get("labels")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

struct ExtractedAlert {
    title: String,
    description: String,
    severity: String,
    labels: std::collections::HashMap<String, String>,
    status: String,
}

fn extract_ticket_info(payload: &Value) -> ExtractedAlert {
    ExtractedAlert {
        title: extract_str(payload, &["title", "alertname", "name"]),
        description: extract_str(payload, &["message", "description"]),
        severity: extract_str(payload, &["severity", "level"]),
        labels: extract_labels(payload),
        status: payload
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("firing")
            .to_string(),
    }
}

pub async fn handle_webhook(
    State(state): State<AppState>,
    Path((namespace_slug, project_id)): Path<(String, Uuid)>,
    Query(query): Query<WebhookQuery>,
    body: Option<Json<Value>>,
) -> (StatusCode, Json<Value>) {
    let namespace = match state.namespaces.find_by_slug(&namespace_slug).await {
        Ok(Some(ns)) => ns,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"detail": format!("Namespace not found: {namespace_slug}")})),
            )
        }
        Err(err) => {
            warn!(error = %err, "failed to look up namespace");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Internal error"})),
            );
        }
    };

    let project = match state.projects.get(project_id).await {
        Ok(Some(p)) if p.namespace_id == namespace.id => p,
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"detail": format!("Project not found: {project_id}")})),
            )
        }
        Err(err) => {
            warn!(error = %err, "failed to look up project");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Internal error"})),
            );
        }
    };

    if !project.is_active {
        return (
            StatusCode::OK,
            Json(json!({"status": "ignored", "message": "Project is disabled"})),
        );
    }

    let Some(Json(payload)) = body else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Invalid JSON payload"})),
        );
    };

    let extracted = extract_ticket_info(&payload);
    let source = query.source;

    if extracted.status == "resolved" {
        let pending = match state
            .tickets
            .find_by_project_and_status(project.id, &[TicketStatus::Pending])
            .await
        {
            Ok(tickets) => tickets,
            Err(err) => {
                warn!(error = %err, "failed to load pending tickets for resolved alert");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": "Internal error"})),
                );
            }
        };

        let mut resolved_count = 0u32;
        for mut ticket in pending {
            ticket.status = TicketStatus::Resolved;
            ticket.resolved_at = Some(chrono::Utc::now());
            ticket.updated_at = chrono::Utc::now();
            ticket.add_event(EventType::Resolved, None, None, None, "自动解决（收到 resolved 状态）");
            if let Err(err) = state.tickets.save(&ticket).await {
                warn!(ticket_id = %ticket.id, error = %err, "failed to save auto-resolved ticket");
                continue;
            }
            resolved_count += 1;
        }

        return (
            StatusCode::OK,
            Json(json!({
                "status": "resolved",
                "message": format!("Resolved {resolved_count} ticket(s)"),
                "source": source,
            })),
        );
    }

    let mut ticket = Ticket::new(
        project.id,
        source.clone(),
        payload,
        None,
        extracted.labels,
        extracted.title,
        extracted.description,
        extracted.severity,
    );
    ticket.add_event(EventType::Created, None, None, None, format!("来源: {source}"));

    if project.is_silenced() {
        ticket.add_event(
            EventType::NotifiedSilenced,
            Some(1),
            None,
            None,
            "项目已静默，跳过通知",
        );
        if let Err(err) = state.tickets.insert(&ticket).await {
            warn!(ticket_id = %ticket.id, error = %err, "failed to insert silenced ticket");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Internal error"})),
            );
        }
        return (
            StatusCode::OK,
            Json(json!({
                "status": "silenced",
                "message": "Ticket created but notifications silenced",
                "ticket_id": ticket.id,
                "source": source,
            })),
        );
    }

    if let Err(err) = state.tickets.insert(&ticket).await {
        warn!(ticket_id = %ticket.id, error = %err, "failed to insert ticket");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "Internal error"})),
        );
    }

    let group_name = if let Some(group_id) = project.notification_group_ids.first() {
        state.groups.get(*group_id).await.ok().flatten().map(|g| g.name)
    } else {
        None
    };

    let results = if state.notify_disabled {
        dispatch::DispatchResult::new()
    } else {
        notify_ticket(
            &ticket,
            1,
            state.projects.as_ref(),
            state.groups.as_ref(),
            state.contacts.as_ref(),
            state.templates.as_ref(),
            state.renderer.as_ref(),
            &state.transport,
            &state.base_url,
        )
        .await
    };

    let success = results.values().any(|ok| *ok);
    let details = if results.is_empty() {
        "无通知组配置".to_string()
    } else {
        format!("通知结果: {results:?}")
    };
    ticket.add_event(EventType::Notified, Some(1), group_name, Some(success), details);
    ticket.last_notified_at = Some(chrono::Utc::now());
    ticket.notification_count = 1;
    ticket.updated_at = chrono::Utc::now();

    if let Err(err) = state.tickets.save(&ticket).await {
        warn!(ticket_id = %ticket.id, error = %err, "failed to save ticket after notification");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "Internal error"})),
        );
    }

    info!(ticket_id = %ticket.id, %source, "ticket created and notified");

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "message": "Ticket created",
            "ticket_id": ticket.id,
            "source": source,
            "notification_results": results,
        })),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    use template_context::HandlebarsRenderer;
    use ticket_store::{InMemoryStore, Namespace, NamespaceStore, Project, ProjectStore, TicketStore};

    use super::*;

    fn state(store: InMemoryStore) -> AppState {
        AppState {
            namespaces: Arc::new(store.clone()),
            projects: Arc::new(store.clone()),
            groups: Arc::new(store.clone()),
            tickets: Arc::new(store.clone()),
            contacts: Arc::new(store.clone()),
            templates: Arc::new(store.clone()),
            renderer: Arc::new(HandlebarsRenderer::new()),
            transport: dispatch::TransportConfig::default(),
            base_url: "https://relay.example.com".to_string(),
            notify_disabled: true,
        }
    }

    fn router(app_state: AppState) -> Router {
        Router::new()
            .route("/webhook/{namespace_slug}/{project_id}", post(handle_webhook))
            .with_state(app_state)
    }

    fn namespace(slug: &str) -> Namespace {
        let now = chrono::Utc::now();
        Namespace {
            id: Uuid::new_v4(),
            name: slug.to_string(),
            slug: slug.to_string(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn project(namespace_id: Uuid, is_active: bool) -> Project {
        let now = chrono::Utc::now();
        Project {
            id: Uuid::new_v4(),
            namespace_id,
            name: "svc".to_string(),
            description: String::new(),
            notification_group_ids: Vec::new(),
            notification_template_id: None,
            escalation_config: ticket_store::EscalationConfig::default(),
            is_active,
            notify_on_ack: false,
            silenced_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn returns_404_for_unknown_namespace() {
        let store = InMemoryStore::new();
        let app = router(state(store));
        let resp = app
            .oneshot(
                Request::post("/webhook/missing/00000000-0000-0000-0000-000000000000?source=test")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn returns_404_for_project_in_different_namespace() {
        let store = InMemoryStore::new();
        let ns = namespace("team-a");
        let other_ns_id = Uuid::new_v4();
        let proj = project(other_ns_id, true);
        store.insert(&ns).await.unwrap();
        store.insert(&proj).await.unwrap();

        let app = router(state(store));
        let uri = format!("/webhook/team-a/{}?source=test", proj.id);
        let resp = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ignores_alert_for_disabled_project() {
        let store = InMemoryStore::new();
        let ns = namespace("team-a");
        let proj = project(ns.id, false);
        store.insert(&ns).await.unwrap();
        store.insert(&proj).await.unwrap();

        let app = router(state(store));
        let uri = format!("/webhook/team-a/{}?source=test", proj.id);
        let resp = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn creates_ticket_and_returns_ok_for_firing_alert() {
        let store = InMemoryStore::new();
        let ns = namespace("team-a");
        let proj = project(ns.id, true);
        store.insert(&ns).await.unwrap();
        store.insert(&proj).await.unwrap();

        let app = router(state(store.clone()));
        let uri = format!("/webhook/team-a/{}?source=prometheus", proj.id);
        let body = serde_json::json!({
            "alertname": "HighCpu",
            "message": "cpu above 90%",
            "severity": "critical",
            "status": "firing",
        });
        let resp = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let tickets = store
            .find_by_project_and_status(proj.id, &[TicketStatus::Pending])
            .await
            .unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].title, "HighCpu");
        assert_eq!(tickets[0].severity, "critical");
    }

    #[tokio::test]
    async fn resolved_status_closes_pending_tickets_without_creating_one() {
        let store = InMemoryStore::new();
        let ns = namespace("team-a");
        let proj = project(ns.id, true);
        store.insert(&ns).await.unwrap();
        store.insert(&proj).await.unwrap();

        let mut ticket = Ticket::new(
            proj.id,
            "prometheus",
            serde_json::json!({}),
            None,
            std::collections::HashMap::new(),
            "HighCpu",
            "desc",
            "critical",
        );
        ticket.status = TicketStatus::Pending;
        store.insert(&ticket).await.unwrap();

        let app = router(state(store.clone()));
        let uri = format!("/webhook/team-a/{}?source=prometheus", proj.id);
        let body = serde_json::json!({"alertname": "HighCpu", "status": "resolved"});
        let resp = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let reloaded = store.get(ticket.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, TicketStatus::Resolved);
    }

    #[tokio::test]
    async fn resolved_status_does_not_sweep_escalated_tickets() {
        let store = InMemoryStore::new();
        let ns = namespace("team-a");
        let proj = project(ns.id, true);
        store.insert(&ns).await.unwrap();
        store.insert(&proj).await.unwrap();

        let mut ticket = Ticket::new(
            proj.id,
            "prometheus",
            serde_json::json!({}),
            None,
            std::collections::HashMap::new(),
            "HighCpu",
            "desc",
            "critical",
        );
        ticket.status = TicketStatus::Escalated;
        ticket.escalation_level = 2;
        store.insert(&ticket).await.unwrap();

        let app = router(state(store.clone()));
        let uri = format!("/webhook/team-a/{}?source=prometheus", proj.id);
        let body = serde_json::json!({"alertname": "HighCpu", "status": "resolved"});
        let resp = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let reloaded = store.get(ticket.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, TicketStatus::Escalated);
    }

    #[tokio::test]
    async fn omitted_source_defaults_to_custom() {
        let store = InMemoryStore::new();
        let ns = namespace("team-a");
        let proj = project(ns.id, true);
        store.insert(&ns).await.unwrap();
        store.insert(&proj).await.unwrap();

        let app = router(state(store.clone()));
        let uri = format!("/webhook/team-a/{}", proj.id);
        let body = serde_json::json!({"alertname": "X", "severity": "critical"});
        let resp = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let tickets = store
            .find_by_project_and_status(proj.id, &[TicketStatus::Pending])
            .await
            .unwrap();
        assert_eq!(tickets[0].source, "custom");
    }

    #[tokio::test]
    async fn silenced_project_still_creates_ticket_but_skips_notification() {
        let store = InMemoryStore::new();
        let ns = namespace("team-a");
        let mut proj = project(ns.id, true);
        proj.silenced_until = Some(chrono::Utc::now() + chrono::Duration::hours(1));
        store.insert(&ns).await.unwrap();
        store.insert(&proj).await.unwrap();

        let app = router(state(store.clone()));
        let uri = format!("/webhook/team-a/{}?source=test", proj.id);
        let body = serde_json::json!({"alertname": "X", "severity": "critical"});
        let resp = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let tickets = store
            .find_by_project_and_status(proj.id, &[TicketStatus::Pending])
            .await
            .unwrap();
        assert_eq!(tickets.len(), 1);
        assert!(tickets[0]
            .events
            .iter()
            .any(|e| e.kind == EventType::NotifiedSilenced));
    }
}
