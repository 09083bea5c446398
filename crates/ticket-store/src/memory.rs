//! An in-process fake store used by tests in this crate and by every
//! downstream crate's test suite. Satisfies the same trait-level query
//! contract as `MongoStore` without simulating index enforcement, since
//! storage mechanics are explicitly out of scope.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::contact::Contact;
use crate::error::StoreError;
use crate::group::NotificationGroup;
use crate::namespace::Namespace;
use crate::project::Project;
use crate::store::{ContactStore, GroupStore, NamespaceStore, ProjectStore, TemplateStore, TicketStore};
use crate::template::NotificationTemplate;
use crate::ticket::{Ticket, TicketStatus};

/// In-memory backing for all six entities, sharing one `Arc` so it can be
/// cloned cheaply into every collaborator that needs a handle to the store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tickets: Arc<RwLock<HashMap<Uuid, Ticket>>>,
    projects: Arc<RwLock<HashMap<Uuid, Project>>>,
    groups: Arc<RwLock<HashMap<Uuid, NotificationGroup>>>,
    contacts: Arc<RwLock<HashMap<Uuid, Contact>>>,
    namespaces: Arc<RwLock<HashMap<Uuid, Namespace>>>,
    templates: Arc<RwLock<HashMap<Uuid, NotificationTemplate>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for InMemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        Ok(self.tickets.read().await.get(&id).cloned())
    }

    async fn find_by_project_and_status(
        &self,
        project_id: Uuid,
        statuses: &[TicketStatus],
    ) -> Result<Vec<Ticket>, StoreError> {
        let tickets = self.tickets.read().await;
        Ok(tickets
            .values()
            .filter(|t| t.project_id == project_id && statuses.contains(&t.status))
            .cloned()
            .collect())
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), StoreError> {
        self.tickets.write().await.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn save(&self, ticket: &Ticket) -> Result<(), StoreError> {
        self.tickets.write().await.insert(ticket.id, ticket.clone());
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        Ok(self.projects.read().await.get(&id).cloned())
    }

    async fn find_enabled_active(&self) -> Result<Vec<Project>, StoreError> {
        let projects = self.projects.read().await;
        Ok(projects
            .values()
            .filter(|p| p.escalation_config.enabled && p.is_active)
            .cloned()
            .collect())
    }

    async fn insert(&self, project: &Project) -> Result<(), StoreError> {
        self.projects.write().await.insert(project.id, project.clone());
        Ok(())
    }

    async fn save(&self, project: &Project) -> Result<(), StoreError> {
        self.projects.write().await.insert(project.id, project.clone());
        Ok(())
    }
}

#[async_trait]
impl GroupStore for InMemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<NotificationGroup>, StoreError> {
        Ok(self.groups.read().await.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<NotificationGroup>, StoreError> {
        Ok(self
            .groups
            .read()
            .await
            .values()
            .find(|g| g.name == name)
            .cloned())
    }

    async fn insert(&self, group: &NotificationGroup) -> Result<(), StoreError> {
        self.groups.write().await.insert(group.id, group.clone());
        Ok(())
    }

    async fn save(&self, group: &NotificationGroup) -> Result<(), StoreError> {
        self.groups.write().await.insert(group.id, group.clone());
        Ok(())
    }
}

#[async_trait]
impl ContactStore for InMemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Contact>, StoreError> {
        Ok(self.contacts.read().await.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Contact>, StoreError> {
        let contacts = self.contacts.read().await;
        Ok(ids.iter().filter_map(|id| contacts.get(id).cloned()).collect())
    }

    async fn insert(&self, contact: &Contact) -> Result<(), StoreError> {
        self.contacts.write().await.insert(contact.id, contact.clone());
        Ok(())
    }

    async fn save(&self, contact: &Contact) -> Result<(), StoreError> {
        self.contacts.write().await.insert(contact.id, contact.clone());
        Ok(())
    }
}

#[async_trait]
impl NamespaceStore for InMemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Namespace>, StoreError> {
        Ok(self.namespaces.read().await.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Namespace>, StoreError> {
        Ok(self
            .namespaces
            .read()
            .await
            .values()
            .find(|n| n.slug == slug)
            .cloned())
    }

    async fn insert(&self, namespace: &Namespace) -> Result<(), StoreError> {
        self.namespaces
            .write()
            .await
            .insert(namespace.id, namespace.clone());
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for InMemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<NotificationTemplate>, StoreError> {
        Ok(self.templates.read().await.get(&id).cloned())
    }

    async fn insert(&self, template: &NotificationTemplate) -> Result<(), StoreError> {
        self.templates
            .write()
            .await
            .insert(template.id, template.clone());
        Ok(())
    }
}
