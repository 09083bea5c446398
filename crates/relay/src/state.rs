//! Shared application state, handed to every handler via axum's
//! `State` extractor — the same `ServerState` shape the teacher's CI
//! server wires through its router.

use std::sync::Arc;

use dispatch::TransportConfig;
use template_context::TemplateRenderer;
use ticket_store::{ContactStore, GroupStore, NamespaceStore, ProjectStore, TemplateStore, TicketStore};

#[derive(Clone)]
pub struct AppState {
    pub namespaces: Arc<dyn NamespaceStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub groups: Arc<dyn GroupStore>,
    pub tickets: Arc<dyn TicketStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub templates: Arc<dyn TemplateStore>,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub transport: TransportConfig,
    pub base_url: String,
    pub notify_disabled: bool,
}
