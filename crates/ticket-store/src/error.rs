//! Error types for the ticket store.

use thiserror::Error;

/// Errors that can occur when reading or writing entities.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing document store rejected or failed the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A document could not be (de)serialized to/from its wire representation.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Backend(err.to_string())
    }
}
