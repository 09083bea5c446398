//! The collaborators one scheduler tick needs, bundled so the background
//! task can own a single cheaply-cloneable value instead of six loose
//! `Arc`s.

use std::sync::Arc;

use dispatch::TransportConfig;
use template_context::TemplateRenderer;
use ticket_store::{ContactStore, GroupStore, ProjectStore, TemplateStore, TicketStore};

#[derive(Clone)]
pub struct SchedulerDeps {
    pub projects: Arc<dyn ProjectStore>,
    pub groups: Arc<dyn GroupStore>,
    pub tickets: Arc<dyn TicketStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub templates: Arc<dyn TemplateStore>,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub transport: TransportConfig,
    pub base_url: String,
}
