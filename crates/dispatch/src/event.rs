//! The transient event handed to a transport adapter for one send.
//!
//! Grounded on the original source's per-send `Event(source, type, labels,
//! payload, meta)` bundle (its own model class was not itself part of the
//! retrieved source tree — only its call sites — so the shape here is
//! reconstructed from usage: a notification carries the ticket's `source`
//! and `labels`/`payload` verbatim, plus a `meta` bag of rendering output
//! the adapter needs to build its wire payload).

use std::collections::HashMap;

use serde_json::Value;

/// Key under which a pre-rendered structured card is placed in `meta`, when
/// one was produced by the rendering pipeline.
pub const CARD_META_KEY: &str = "template_card";

/// One notification send, carrying everything a transport adapter needs to
/// build its wire payload without reaching back into the ticket store.
#[derive(Debug, Clone)]
pub struct DispatchEvent {
    pub source: String,
    pub kind: String,
    pub labels: HashMap<String, String>,
    pub payload: Value,
    pub meta: HashMap<String, Value>,
}

impl DispatchEvent {
    #[must_use]
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(Value::as_str)
    }
}
