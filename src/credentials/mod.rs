//! # Credentials
//!
//! Opaque verification of operator accounts. The inventory and notification paths never
//! consult it; it is published over RPC for clients that gate their own screens on a login.

mod sqlite;

pub use sqlite::{hash_secret, SqliteCredentialStore};

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{NewUser, User};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CredentialError {
    #[error("Credential storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<sqlx::Error> for CredentialError {
    fn from(e: sqlx::Error) -> Self {
        CredentialError::StorageUnavailable(e.to_string())
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Returns the account when `username` exists and `secret` matches it.
    async fn verify_credentials(
        &self,
        username: &str,
        secret: &str,
    ) -> Result<Option<User>, CredentialError>;

    async fn username_taken(&self, username: &str) -> Result<bool, CredentialError>;

    async fn email_taken(&self, email: &str) -> Result<bool, CredentialError>;

    /// Stores a new account. Returns `false` when the username or email is already in use.
    async fn register(&self, user: NewUser) -> Result<bool, CredentialError>;
}
