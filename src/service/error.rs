use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Coarse failure category reported to remote callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    StorageUnavailable,
    /// The request itself could not be understood. Raised by the RPC layer only.
    BadRequest,
    /// The server could not encode its own reply.
    Internal,
}

impl From<&StoreError> for ErrorKind {
    fn from(e: &StoreError) -> Self {
        match e {
            StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
        }
    }
}

/// A store failure annotated with the service operation that hit it.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{operation}: {source}")]
pub struct ServiceError {
    pub operation: &'static str,
    #[source]
    pub source: StoreError,
}

impl ServiceError {
    pub(crate) fn wrap(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self { operation, source }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::from(&self.source)
    }
}
