//! Store contracts: one trait per entity, backed by either a real document
//! store (`MongoStore`) or an in-process fake (`InMemoryStore`).
//!
//! Every operation returns `Result<_, StoreError>`; absence of an id is a
//! `None`/empty result, never an error (§4.A: "Absence of an id returns a
//! missing signal, not failure").

use async_trait::async_trait;
use uuid::Uuid;

use crate::contact::Contact;
use crate::error::StoreError;
use crate::group::NotificationGroup;
use crate::namespace::Namespace;
use crate::project::Project;
use crate::template::NotificationTemplate;
use crate::ticket::{Ticket, TicketStatus};

/// Durable state of tickets, indexed by project and status.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Ticket>, StoreError>;

    /// Tickets for one project whose status is one of `statuses`, as read
    /// by the escalation scheduler and the intake adapter's auto-close path.
    async fn find_by_project_and_status(
        &self,
        project_id: Uuid,
        statuses: &[TicketStatus],
    ) -> Result<Vec<Ticket>, StoreError>;

    async fn insert(&self, ticket: &Ticket) -> Result<(), StoreError>;

    /// Full-document overwrite (§5: the only write mode; concurrent writers
    /// on the same ticket race and the hazard is accepted, not mitigated
    /// here).
    async fn save(&self, ticket: &Ticket) -> Result<(), StoreError>;
}

/// Projects carry escalation policy, the notification group order, and
/// silence state.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Project>, StoreError>;

    /// Projects eligible for a scheduler sweep: `escalation_config.enabled`
    /// and `is_active`.
    async fn find_enabled_active(&self) -> Result<Vec<Project>, StoreError>;

    async fn insert(&self, project: &Project) -> Result<(), StoreError>;

    async fn save(&self, project: &Project) -> Result<(), StoreError>;
}

/// Notification groups, resolved by id from a project's ordered list.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<NotificationGroup>, StoreError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<NotificationGroup>, StoreError>;

    async fn insert(&self, group: &NotificationGroup) -> Result<(), StoreError>;

    async fn save(&self, group: &NotificationGroup) -> Result<(), StoreError>;
}

/// Contacts, resolved by id from a channel config's `contact_ids`.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Contact>, StoreError>;

    /// Batch fetch, as the dispatcher does per channel config — ids that no
    /// longer resolve are simply absent from the result, not an error.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Contact>, StoreError>;

    async fn insert(&self, contact: &Contact) -> Result<(), StoreError>;

    async fn save(&self, contact: &Contact) -> Result<(), StoreError>;
}

/// Namespaces, resolved by slug from the webhook route.
#[async_trait]
pub trait NamespaceStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Namespace>, StoreError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Namespace>, StoreError>;

    async fn insert(&self, namespace: &Namespace) -> Result<(), StoreError>;
}

/// Notification templates, resolved by a project's optional template id.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<NotificationTemplate>, StoreError>;

    async fn insert(&self, template: &NotificationTemplate) -> Result<(), StoreError>;
}
