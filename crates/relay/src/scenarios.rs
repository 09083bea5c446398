//! End-to-end scenario tests (spec properties S1/S6), exercising the
//! webhook intake and ack gateway handlers together against a real HTTP
//! mock for the transport leg, the way `pm`/`integrations` drive their
//! dev-dependency `wiremock` servers instead of mocking the adapter trait.

#![cfg(test)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dispatch::TransportConfig;
use template_context::HandlebarsRenderer;
use ticket_store::{
    ChannelConfig, ChannelType, Contact, ContactStore, GroupStore, InMemoryStore, Namespace,
    NamespaceStore, NotificationGroup, Project, ProjectStore, TicketStatus, TicketStore,
};

use crate::ack::handle_ack;
use crate::state::AppState;
use crate::webhook::handle_webhook;

fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/{namespace_slug}/{project_id}", post(handle_webhook))
        .route("/ack/{ticket_id}", get(handle_ack))
        .with_state(state)
}

async fn state_with(store: InMemoryStore) -> AppState {
    AppState {
        namespaces: Arc::new(store.clone()),
        projects: Arc::new(store.clone()),
        groups: Arc::new(store.clone()),
        tickets: Arc::new(store.clone()),
        contacts: Arc::new(store.clone()),
        templates: Arc::new(store.clone()),
        renderer: Arc::new(HandlebarsRenderer::new()),
        transport: TransportConfig::default(),
        base_url: "https://relay.example.com".to_string(),
        notify_disabled: false,
    }
}

#[tokio::test]
async fn s1_simple_ack_via_link() {
    let feishu_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
        .mount(&feishu_server)
        .await;

    let store = InMemoryStore::new();
    let now = chrono::Utc::now();

    let contact = Contact {
        id: uuid::Uuid::new_v4(),
        name: "oncall".to_string(),
        phones: Vec::new(),
        emails: Vec::new(),
        feishu_webhook_url: format!("{}/hook", feishu_server.uri()),
        slack_channel_id: String::new(),
        note: String::new(),
        created_at: now,
        updated_at: now,
    };
    store.insert(&contact).await.unwrap();

    let group = NotificationGroup {
        id: uuid::Uuid::new_v4(),
        name: "primary".to_string(),
        description: String::new(),
        repeat_interval: None,
        channel_configs: vec![ChannelConfig {
            kind: ChannelType::Feishu,
            contact_ids: vec![contact.id],
        }],
        created_at: now,
        updated_at: now,
    };
    store.insert(&group).await.unwrap();

    let namespace = Namespace {
        id: uuid::Uuid::new_v4(),
        name: "team-a".to_string(),
        slug: "team-a".to_string(),
        description: String::new(),
        created_at: now,
        updated_at: now,
    };
    store.insert(&namespace).await.unwrap();

    let project = Project {
        id: uuid::Uuid::new_v4(),
        namespace_id: namespace.id,
        name: "svc".to_string(),
        description: String::new(),
        notification_group_ids: vec![group.id],
        notification_template_id: None,
        escalation_config: ticket_store::EscalationConfig::default(),
        is_active: true,
        notify_on_ack: false,
        silenced_until: None,
        created_at: now,
        updated_at: now,
    };
    store.insert(&project).await.unwrap();

    let app = router(state_with(store.clone()).await);
    let uri = format!("/webhook/team-a/{}?source=prometheus", project.id);
    let body = json!({"alertname": "disk full", "message": "95% used", "severity": "critical"});
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
        .find_by_project_and_status(project.id, &[TicketStatus::Pending])
        .await
        .unwrap();
    assert_eq!(tickets.len(), 1);
    let ticket = &tickets[0];
    let notified = ticket
        .events
        .iter()
        .find(|e| e.kind == ticket_store::EventType::Notified)
        .expect("a notified event");
    assert_eq!(notified.level, Some(1));
    assert_eq!(notified.success, Some(true));

    let app = router(state_with(store.clone()).await);
    let ack_uri = format!(
        "/ack/{}?token={}&format=json",
        ticket.id, ticket.ack_token
    );
    let resp = app
        .oneshot(Request::get(ack_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "acknowledged");
    assert_eq!(json["ticket_id"], ticket.id.to_string());

    let reloaded = store.get(ticket.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, TicketStatus::Acknowledged);
    assert_eq!(reloaded.acknowledged_by.as_deref(), Some("link"));
}

#[tokio::test]
async fn s6_bad_token_leaves_ticket_unchanged() {
    let store = InMemoryStore::new();
    let now = chrono::Utc::now();
    let namespace = Namespace {
        id: uuid::Uuid::new_v4(),
        name: "team-a".to_string(),
        slug: "team-a".to_string(),
        description: String::new(),
        created_at: now,
        updated_at: now,
    };
    store.insert(&namespace).await.unwrap();
    let project = Project {
        id: uuid::Uuid::new_v4(),
        namespace_id: namespace.id,
        name: "svc".to_string(),
        description: String::new(),
        notification_group_ids: Vec::new(),
        notification_template_id: None,
        escalation_config: ticket_store::EscalationConfig::default(),
        is_active: true,
        notify_on_ack: false,
        silenced_until: None,
        created_at: now,
        updated_at: now,
    };
    store.insert(&project).await.unwrap();

    let app = router(state_with(store.clone()).await);
    let uri = format!("/webhook/team-a/{}?source=prometheus", project.id);
    let body = json!({"alertname": "x", "severity": "critical"});
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
        .find_by_project_and_status(project.id, &[TicketStatus::Pending])
        .await
        .unwrap();
    let ticket = tickets[0].clone();
    let event_count_before = ticket.events.len();

    let app = router(state_with(store.clone()).await);
    let ack_uri = format!("/ack/{}?token=wrong&format=json", ticket.id);
    let resp = app
        .oneshot(Request::get(ack_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let reloaded = store.get(ticket.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, TicketStatus::Pending);
    assert_eq!(reloaded.events.len(), event_count_before);
}
