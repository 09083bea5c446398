//! Acknowledgement gateway (§4.D): `GET /ack/{ticket_id}`.
//!
//! Accepts the ack token as a query parameter rather than requiring a
//! session, so the link in a notification message works standalone.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::{info, warn};
use uuid::Uuid;

use dispatch::notify_ticket_acknowledged;
use ticket_store::{EventType, TicketStatus};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AckQuery {
    pub token: String,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "redirect".to_string()
}

/// Compares in constant time regardless of length mismatch, so the
/// response timing cannot leak how many leading bytes of a guessed token
/// were correct.
fn tokens_match(expected: &str, supplied: &str) -> bool {
    let expected = expected.as_bytes();
    let supplied = supplied.as_bytes();
    if expected.len() != supplied.len() {
        let zeroes = vec![0u8; expected.len()];
        let _ = zeroes.ct_eq(expected);
        return false;
    }
    expected.ct_eq(supplied).into()
}

fn not_found(format: &str) -> Response {
    if format == "json" {
        (StatusCode::NOT_FOUND, Json(json!({"detail": "Ticket not found"}))).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Html("<html><body><h1>Ticket not found</h1></body></html>"),
        )
            .into_response()
    }
}

fn invalid_token(format: &str) -> Response {
    if format == "json" {
        (StatusCode::FORBIDDEN, Json(json!({"detail": "Invalid token"}))).into_response()
    } else {
        (
            StatusCode::FORBIDDEN,
            Html("<html><body><h1>Invalid token</h1></body></html>"),
        )
            .into_response()
    }
}

/// A 302 redirect, as `ack.py` issues via its framework's `RedirectResponse`
/// default (axum's own `Redirect::to` defaults to 303, so this is built by
/// hand to keep the exact status code).
fn redirect_to_ticket(ticket_id: Uuid) -> Response {
    (StatusCode::FOUND, [(LOCATION, format!("/tickets/{ticket_id}"))]).into_response()
}

fn already(format: &str, ticket_id: Uuid, status: &str, label: &str) -> Response {
    match format {
        "json" => Json(json!({"status": status, "ticket_id": ticket_id})).into_response(),
        "html" => Html(format!("<html><body><h1>{label}</h1></body></html>")).into_response(),
        _ => redirect_to_ticket(ticket_id),
    }
}

pub async fn handle_ack(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    Query(query): Query<AckQuery>,
) -> Response {
    let ticket = match state.tickets.get(ticket_id).await {
        Ok(Some(t)) => t,
        Ok(None) => return not_found(&query.format),
        Err(err) => {
            warn!(error = %err, "failed to load ticket for ack");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response();
        }
    };

    if !tokens_match(&ticket.ack_token, &query.token) {
        return invalid_token(&query.format);
    }

    if ticket.status == TicketStatus::Acknowledged {
        return already(&query.format, ticket_id, "already_acknowledged", "Already acknowledged");
    }
    if ticket.status == TicketStatus::Resolved {
        return already(&query.format, ticket_id, "already_resolved", "Already resolved");
    }

    let mut ticket = ticket;
    ticket.status = TicketStatus::Acknowledged;
    let now = chrono::Utc::now();
    ticket.acknowledged_at = Some(now);
    ticket.acknowledged_by = Some("link".to_string());
    ticket.updated_at = now;
    ticket.add_event(EventType::Acknowledged, None, None, None, "通过回调链接确认");

    if let Err(err) = state.tickets.save(&ticket).await {
        warn!(ticket_id = %ticket.id, error = %err, "failed to save acknowledged ticket");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response();
    }

    info!(ticket_id = %ticket.id, "ticket acknowledged via link");

    if !state.notify_disabled {
        let results = notify_ticket_acknowledged(
            &ticket,
            "链接确认",
            state.projects.as_ref(),
            state.groups.as_ref(),
            state.contacts.as_ref(),
            state.templates.as_ref(),
            state.renderer.as_ref(),
            &state.transport,
            &state.base_url,
        )
        .await;
        if results.values().any(|ok| !*ok) {
            warn!(ticket_id = %ticket.id, "one or more ack notifications failed");
        }
    }

    match query.format.as_str() {
        "json" => Json(json!({"status": "acknowledged", "ticket_id": ticket.id})).into_response(),
        "html" => Html(format!(
            "<html><head><title>Acknowledged</title></head><body style=\"font-family: sans-serif; padding: 40px; text-align: center;\"><h1 style=\"color: green;\">✓ Ticket Acknowledged</h1><p>Ticket ID: {}</p><p>Time: {}</p></body></html>",
            ticket.id,
            now.format("%Y-%m-%d %H:%M:%S UTC"),
        ))
        .into_response(),
        _ => redirect_to_ticket(ticket.id),
    }
}
