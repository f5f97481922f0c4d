use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::{debug, info, instrument};

use super::{CredentialError, CredentialStore};
use crate::model::{NewUser, User};

/// Lowercase hex SHA-256 digest of `secret`, the form stored in `users.password`.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Credential store over the `users` table.
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the `users` table if needed.
    pub async fn provision(&self) -> Result<(), CredentialError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                username   TEXT NOT NULL UNIQUE,
                email      TEXT NOT NULL UNIQUE,
                password   TEXT NOT NULL,
                full_name  TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        debug!("Credential schema ready");
        Ok(())
    }

    async fn exists(&self, sql: &str, value: &str) -> Result<bool, CredentialError> {
        let count: i64 = sqlx::query_scalar(sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    #[instrument(skip(self, secret))]
    async fn verify_credentials(
        &self,
        username: &str,
        secret: &str,
    ) -> Result<Option<User>, CredentialError> {
        let row = sqlx::query(
            "SELECT id, username, email, full_name FROM users WHERE username = ?1 AND password = ?2",
        )
        .bind(username)
        .bind(hash_secret(secret))
        .fetch_optional(&self.pool)
        .await?;

        let user = row
            .map(|row| -> Result<User, sqlx::Error> {
                Ok(User {
                    id: row.try_get("id")?,
                    username: row.try_get("username")?,
                    email: row.try_get("email")?,
                    full_name: row.try_get("full_name")?,
                })
            })
            .transpose()?;
        debug!(verified = user.is_some(), "Credentials checked");
        Ok(user)
    }

    async fn username_taken(&self, username: &str) -> Result<bool, CredentialError> {
        self.exists("SELECT COUNT(*) FROM users WHERE username = ?1", username)
            .await
    }

    async fn email_taken(&self, email: &str) -> Result<bool, CredentialError> {
        self.exists("SELECT COUNT(*) FROM users WHERE email = ?1", email)
            .await
    }

    #[instrument(skip(self))]
    async fn register(&self, user: NewUser) -> Result<bool, CredentialError> {
        let result = sqlx::query(
            "INSERT INTO users (username, email, password, full_name) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(hash_secret(&user.secret))
        .bind(&user.full_name)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(username = %user.username, "Registered user");
                Ok(true)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                info!(username = %user.username, "Registration refused: duplicate");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}
