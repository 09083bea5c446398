//! The notification dispatcher (§4.B): given a ticket, a target
//! notification group, and a set of rendering flags, resolves contacts and
//! fans out one message per channel entry, returning a per-channel success
//! map.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod adapters;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod transport_config;

pub use adapter::TransportAdapter;
pub use dispatch::{notify_ticket, notify_ticket_acknowledged, send_to_group, DispatchResult};
pub use error::ChannelError;
pub use event::DispatchEvent;
pub use transport_config::TransportConfig;
