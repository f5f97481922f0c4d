//! # Notifier
//!
//! Pushes one-line text events to every connected observer.
//!
//! - [`Notifier`] keeps the observer registry and implements [`Broadcast`].
//! - [`NotificationListener`] accepts observer connections and writes their events.
//!
//! Delivery is best effort. An observer that disconnects, stalls on a write, or falls a full
//! queue behind is dropped; nobody else notices.

pub mod error;
pub mod listener;
pub mod registry;

pub use error::{ChannelError, NotifierError};
pub use listener::NotificationListener;
pub use registry::{Broadcast, Notifier, ObserverId};
