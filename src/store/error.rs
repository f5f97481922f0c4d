//! Error types for the store actor.

use thiserror::Error;

use crate::model::ProductId;

/// Failures of the channel between a [`StoreClient`](super::StoreClient) and the store actor.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error("Store actor closed")]
    ActorClosed,
    #[error("Store actor dropped response channel")]
    ActorDropped,
}

/// Errors that can occur during store operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// The input to a mutating operation is malformed. Not retried.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The operation referenced a product that does not exist.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The backing store (or the actor fronting it) cannot be reached.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<FrameworkError> for StoreError {
    fn from(e: FrameworkError) -> Self {
        StoreError::StorageUnavailable(e.to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::StorageUnavailable(e.to_string())
    }
}
