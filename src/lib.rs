//! # Inventory Hub
//!
//! > **A shared product inventory with atomic sales and live notifications.**
//!
//! Remote clients manage a product catalog and record sales over a line-delimited JSON RPC
//! protocol. Every successful change is pushed, as one line of text, to every client connected
//! to the notification channel.
//!
//! ## Design
//!
//! ### One writer
//! All product and sale state belongs to a single store actor. Requests reach it through a
//! bounded channel and are handled one at a time, so a sale (check stock, debit it, append a
//! record) is atomic without locks. Two clients racing for the last unit get exactly one
//! success.
//!
//! ### Fire-and-forget notifications
//! Events are queued per observer and written by that observer's own task. A stalled or dead
//! observer is dropped; it never slows a sale or another observer.
//!
//! ### Errors
//! Each layer has its own `thiserror` enum. Store failures reach remote callers as a kind
//! (`validation`, `not_found`, `storage_unavailable`) plus a message naming the operation.
//!
//! ## Module Tour
//!
//! - [`model`]: products, sale records and accounts.
//! - [`store`]: the store actor, its client and the memory and SQLite repositories.
//! - [`notifier`]: observer registry and notification listener.
//! - [`service`]: [`InventoryService`](service::InventoryService), validation and events.
//! - [`credentials`]: account registration and verification.
//! - [`rpc`]: wire protocol and server.
//! - [`clients`]: typed RPC client and notification subscriber.
//! - [`framing`]: bounded line reader shared by both sockets.
//! - [`lifecycle`]: settings, tracing and the [`ServiceHost`](lifecycle::ServiceHost).
//!
//! ## Example
//!
//! ```rust,no_run
//! use inventory_hub::clients::{NotificationSubscriber, RpcClient};
//! use inventory_hub::lifecycle::{ServiceHost, Settings};
//! use inventory_hub::model::ProductCreate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = ServiceHost::start(&Settings::ephemeral()).await?;
//!     let mut events = NotificationSubscriber::connect(host.notify_addr()).await?;
//!     let client = RpcClient::connect(host.rpc_addr()).await?;
//!
//!     let widget = client.add_product(ProductCreate::new("Widget", 10.0, 3)).await?;
//!     assert!(client.sell(widget.id, 2).await?);
//!     println!("{:?}", events.next_event().await?);
//!
//!     host.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod clients;
pub mod credentials;
pub mod framing;
pub mod lifecycle;
pub mod model;
pub mod notifier;
pub mod rpc;
pub mod service;
pub mod store;
