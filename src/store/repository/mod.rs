//! # Repositories
//!
//! Backing storage for the store actor. The actor owns its repository exclusively and calls it
//! one request at a time, so implementations take `&mut self` and need no locking of their own.
//!
//! - [`MemoryRepository`]: process-local maps, used for tests and ephemeral runs.
//! - [`SqliteRepository`]: durable tables through `sqlx`.

mod memory;
mod sqlite;

pub use memory::MemoryRepository;
pub use sqlite::{open_pool, SqliteRepository};

use async_trait::async_trait;

use super::error::StoreError;
use crate::model::{Product, ProductCreate, ProductId, SaleOutcome, SaleRecord};

/// Storage operations behind the store actor.
///
/// Inputs reaching a repository are already validated by the actor.
#[async_trait]
pub trait Repository: Send + 'static {
    /// Short name used in logs (e.g. `"sqlite"`).
    fn backend(&self) -> &'static str;

    /// Creates tables if needed. Safe to call on every start.
    async fn provision(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_product(&mut self, params: ProductCreate) -> Result<Product, StoreError>;

    /// Overwrites every mutable field. Returns `false` when the id does not exist.
    async fn replace_product(&mut self, product: &Product) -> Result<bool, StoreError>;

    /// Removes a product. Missing ids are not an error.
    async fn remove_product(&mut self, id: ProductId) -> Result<(), StoreError>;

    async fn products(&mut self) -> Result<Vec<Product>, StoreError>;

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Checks stock and, when sufficient, debits it and appends a sale record. All effects
    /// land together or not at all.
    async fn sell(&mut self, id: ProductId, quantity: i64) -> Result<SaleOutcome, StoreError>;

    /// Sale records, newest first.
    async fn sales(&mut self) -> Result<Vec<SaleRecord>, StoreError>;

    /// Clears sales, then products, and restarts id sequences.
    async fn clear(&mut self) -> Result<(), StoreError>;
}
