//! Process lifecycle: settings, tracing setup and the [`ServiceHost`].

pub mod config;
pub mod host;
pub mod tracing;

pub use config::{ConfigError, Settings};
pub use host::{HostError, ServiceHost};
pub use self::tracing::setup_tracing;
