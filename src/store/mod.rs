//! # Store
//!
//! Exclusive owner of product and sale state.
//!
//! ## Structure
//!
//! - [`actor`] - [`StoreActor`], the single writer that processes requests one at a time
//! - [`client`] - [`StoreClient`], the cloneable request handle
//! - [`message`] - [`StoreRequest`] and its reply channel type
//! - [`repository`] - [`Repository`] and its memory and SQLite backends
//! - [`error`] - [`StoreError`] and [`FrameworkError`]
//! - [`mock`] - helpers for testing store callers without an actor
//!
//! ## Usage
//!
//! ```rust
//! use inventory_hub::model::ProductCreate;
//! use inventory_hub::store::{self, MemoryRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (actor, client) = store::new(32, MemoryRepository::new());
//!     tokio::spawn(actor.run());
//!
//!     let widget = client.create_product(ProductCreate::new("Widget", 10.0, 3)).await?;
//!     let outcome = client.process_sale(widget.id, 2).await?;
//!     assert!(outcome.is_sold());
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod client;
pub mod error;
pub mod message;
pub mod mock;
pub mod repository;

pub use actor::StoreActor;
pub use client::StoreClient;
pub use error::{FrameworkError, StoreError};
pub use message::{Response, StoreRequest};
pub use repository::{open_pool, MemoryRepository, Repository, SqliteRepository};

/// Creates a new store actor over `repository` and its client.
pub fn new(buffer_size: usize, repository: impl Repository) -> (StoreActor, StoreClient) {
    StoreActor::new(buffer_size, repository)
}
