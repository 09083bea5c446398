//! The alert relay binary: webhook intake, acknowledgement gateway, and the
//! escalation scheduler's process owner, wired the way `healer::ci::server`
//! wires its own router and `tasks::mcp::server` wires its own tracing init.

mod ack;
mod config;
#[cfg(test)]
mod scenarios;
mod state;
mod webhook;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::{Config, LogFormat};
use dispatch::TransportConfig;
use scheduler::{EscalationScheduler, SchedulerDeps};
use state::AppState;
use template_context::HandlebarsRenderer;
use ticket_store::MongoStore;

fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/webhook/{namespace_slug}/{project_id}",
            axum::routing::post(webhook::handle_webhook),
        )
        .route("/ack/{ticket_id}", get(ack::handle_ack))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_format);

    let store = MongoStore::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    store.ensure_indexes().await?;
    let store = Arc::new(store);

    let renderer = Arc::new(HandlebarsRenderer::new());
    let transport = TransportConfig::from_env();

    let app_state = AppState {
        namespaces: store.clone(),
        projects: store.clone(),
        groups: store.clone(),
        tickets: store.clone(),
        contacts: store.clone(),
        templates: store.clone(),
        renderer: renderer.clone(),
        transport: transport.clone(),
        base_url: config.base_url.clone(),
        notify_disabled: config.notify_disabled,
    };

    let scheduler_deps = SchedulerDeps {
        projects: store.clone(),
        groups: store.clone(),
        tickets: store.clone(),
        contacts: store.clone(),
        templates: store.clone(),
        renderer,
        transport,
        base_url: config.base_url.clone(),
    };
    EscalationScheduler::global()
        .start(
            scheduler_deps,
            Duration::from_secs(config.escalation_check_interval_secs),
        )
        .await;

    let app = build_router(app_state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "alert relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    EscalationScheduler::global().stop().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
