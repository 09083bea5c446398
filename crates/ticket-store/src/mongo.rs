//! The production document-store backend.
//!
//! One `mongodb::Collection<T>` per entity, with the indexes named in
//! §4.A established once at startup. Ids are stored as their `Uuid`
//! string encoding (not Mongo's native `ObjectId`) so the webhook route's
//! `project_id` comparison and this crate's in-memory fake agree on the
//! identical string encoding (§9 open question 4).

use async_trait::async_trait;
use bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use uuid::Uuid;

use crate::contact::Contact;
use crate::error::StoreError;
use crate::group::NotificationGroup;
use crate::namespace::Namespace;
use crate::project::Project;
use crate::store::{ContactStore, GroupStore, NamespaceStore, ProjectStore, TemplateStore, TicketStore};
use crate::template::NotificationTemplate;
use crate::ticket::{Ticket, TicketStatus};

/// A MongoDB-backed store, one collection per entity.
#[derive(Clone)]
pub struct MongoStore {
    tickets: Collection<Ticket>,
    projects: Collection<Project>,
    groups: Collection<NotificationGroup>,
    contacts: Collection<Contact>,
    namespaces: Collection<Namespace>,
    templates: Collection<NotificationTemplate>,
}

impl MongoStore {
    /// Connect and select the named database. Does not establish indexes;
    /// call `ensure_indexes` once at process startup.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::from_client(&client, database))
    }

    #[must_use]
    pub fn from_client(client: &Client, database: &str) -> Self {
        let db: Database = client.database(database);
        Self {
            tickets: db.collection("tickets"),
            projects: db.collection("projects"),
            groups: db.collection("notification_groups"),
            contacts: db.collection("contacts"),
            namespaces: db.collection("namespaces"),
            templates: db.collection("notification_templates"),
        }
    }

    /// Establish the secondary indexes named in §4.A: `status`,
    /// `created_at`, `(project_id, status)`, `(project_id, created_at desc)`
    /// on tickets, plus the unique lookup indexes used elsewhere (namespace
    /// slug, group name).
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        self.tickets
            .create_indexes(vec![
                IndexModel::builder().keys(doc! { "status": 1 }).build(),
                IndexModel::builder().keys(doc! { "created_at": 1 }).build(),
                IndexModel::builder()
                    .keys(doc! { "project_id": 1, "status": 1 })
                    .build(),
                IndexModel::builder()
                    .keys(doc! { "project_id": 1, "created_at": -1 })
                    .build(),
            ])
            .await?;

        self.namespaces
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "slug": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;

        self.groups
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;

        Ok(())
    }
}

#[async_trait]
impl TicketStore for MongoStore {
    async fn get(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        Ok(self.tickets.find_one(doc! { "id": id.to_string() }).await?)
    }

    async fn find_by_project_and_status(
        &self,
        project_id: Uuid,
        statuses: &[TicketStatus],
    ) -> Result<Vec<Ticket>, StoreError> {
        let tags: Vec<&str> = statuses.iter().copied().map(TicketStatus::as_str).collect();
        let filter = doc! {
            "project_id": project_id.to_string(),
            "status": { "$in": tags },
        };
        let mut cursor = self.tickets.find(filter).await?;
        let mut out = Vec::new();
        while cursor.advance().await? {
            out.push(cursor.deserialize_current()?);
        }
        Ok(out)
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), StoreError> {
        self.tickets.insert_one(ticket).await?;
        Ok(())
    }

    async fn save(&self, ticket: &Ticket) -> Result<(), StoreError> {
        self.tickets
            .replace_one(doc! { "id": ticket.id.to_string() }, ticket)
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for MongoStore {
    async fn get(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        Ok(self.projects.find_one(doc! { "id": id.to_string() }).await?)
    }

    async fn find_enabled_active(&self) -> Result<Vec<Project>, StoreError> {
        let filter = doc! {
            "escalation_config.enabled": true,
            "is_active": true,
        };
        let mut cursor = self.projects.find(filter).await?;
        let mut out = Vec::new();
        while cursor.advance().await? {
            out.push(cursor.deserialize_current()?);
        }
        Ok(out)
    }

    async fn insert(&self, project: &Project) -> Result<(), StoreError> {
        self.projects.insert_one(project).await?;
        Ok(())
    }

    async fn save(&self, project: &Project) -> Result<(), StoreError> {
        self.projects
            .replace_one(doc! { "id": project.id.to_string() }, project)
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl GroupStore for MongoStore {
    async fn get(&self, id: Uuid) -> Result<Option<NotificationGroup>, StoreError> {
        Ok(self.groups.find_one(doc! { "id": id.to_string() }).await?)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<NotificationGroup>, StoreError> {
        Ok(self.groups.find_one(doc! { "name": name }).await?)
    }

    async fn insert(&self, group: &NotificationGroup) -> Result<(), StoreError> {
        self.groups.insert_one(group).await?;
        Ok(())
    }

    async fn save(&self, group: &NotificationGroup) -> Result<(), StoreError> {
        self.groups
            .replace_one(doc! { "id": group.id.to_string() }, group)
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ContactStore for MongoStore {
    async fn get(&self, id: Uuid) -> Result<Option<Contact>, StoreError> {
        Ok(self.contacts.find_one(doc! { "id": id.to_string() }).await?)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Contact>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_strings: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let mut cursor = self
            .contacts
            .find(doc! { "id": { "$in": id_strings } })
            .await?;
        let mut out = Vec::new();
        while cursor.advance().await? {
            out.push(cursor.deserialize_current()?);
        }
        Ok(out)
    }

    async fn insert(&self, contact: &Contact) -> Result<(), StoreError> {
        self.contacts.insert_one(contact).await?;
        Ok(())
    }

    async fn save(&self, contact: &Contact) -> Result<(), StoreError> {
        self.contacts
            .replace_one(doc! { "id": contact.id.to_string() }, contact)
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl NamespaceStore for MongoStore {
    async fn get(&self, id: Uuid) -> Result<Option<Namespace>, StoreError> {
        Ok(self
            .namespaces
            .find_one(doc! { "id": id.to_string() })
            .await?)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Namespace>, StoreError> {
        Ok(self.namespaces.find_one(doc! { "slug": slug }).await?)
    }

    async fn insert(&self, namespace: &Namespace) -> Result<(), StoreError> {
        self.namespaces.insert_one(namespace).await?;
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for MongoStore {
    async fn get(&self, id: Uuid) -> Result<Option<NotificationTemplate>, StoreError> {
        Ok(self
            .templates
            .find_one(doc! { "id": id.to_string() })
            .await?)
    }

    async fn insert(&self, template: &NotificationTemplate) -> Result<(), StoreError> {
        self.templates.insert_one(template).await?;
        Ok(())
    }
}
