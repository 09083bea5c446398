//! Entities and the document-store abstraction for the alert relay's
//! ticket lifecycle engine.
//!
//! This crate owns the durable shape of every entity in the system
//! (`Ticket`, `Project`, `NotificationGroup`, `Contact`, `Namespace`,
//! `NotificationTemplate`) and the store traits that the rest of the
//! workspace depends on rather than any one backend. Two backends are
//! provided: [`MongoStore`] for production, and [`InMemoryStore`] for
//! tests.
//!
//! All inter-entity links are by id, never by in-memory reference; callers
//! resolve references on demand and must tolerate dangling ids (a project,
//! group, or contact may be deleted out from under a ticket that still
//! names it).

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod contact;
pub mod error;
pub mod group;
pub mod memory;
pub mod mongo;
pub mod namespace;
pub mod project;
pub mod store;
pub mod template;
pub mod ticket;

pub use contact::Contact;
pub use error::StoreError;
pub use group::{ChannelConfig, ChannelType, NotificationGroup};
pub use memory::InMemoryStore;
pub use mongo::MongoStore;
pub use namespace::Namespace;
pub use project::{EscalationConfig, Project};
pub use store::{ContactStore, GroupStore, NamespaceStore, ProjectStore, TemplateStore, TicketStore};
pub use template::NotificationTemplate;
pub use ticket::{EventType, Ticket, TicketEvent, TicketStatus};
