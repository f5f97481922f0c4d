//! Layered settings: built-in defaults, then an optional TOML file, then `INVENTORY_`
//! environment variables (`INVENTORY_SERVER__RPC_PORT=2000`).

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `storage.url` value selecting the in-memory repository.
pub const MEMORY_STORAGE: &str = "memory";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub rpc_port: u16,
    pub notify_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            rpc_port: 1099,
            notify_port: 9090,
        }
    }
}

impl ServerSettings {
    pub fn rpc_addr(&self) -> String {
        format!("{}:{}", self.host, self.rpc_port)
    }

    pub fn notify_addr(&self) -> String {
        format!("{}:{}", self.host, self.notify_port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// A SQLite URL, or [`MEMORY_STORAGE`].
    pub url: String,
    pub max_connections: u32,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://inventory.db".to_string(),
            max_connections: 5,
        }
    }
}

impl StorageSettings {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_STORAGE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierSettings {
    /// Events an observer may fall behind before it is dropped.
    pub queue_capacity: usize,
    pub write_timeout_ms: u64,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            write_timeout_ms: 2000,
        }
    }
}

impl NotifierSettings {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub buffer_size: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { buffer_size: 32 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub notifier: NotifierSettings,
    pub store: StoreSettings,
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Loads settings. A missing file is not an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::figment(path).extract()?)
    }

    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("INVENTORY_").split("__"))
    }

    /// Settings for an ephemeral instance: in-memory storage and OS-assigned local ports.
    pub fn ephemeral() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                rpc_port: 0,
                notify_port: 0,
            },
            storage: StorageSettings {
                url: MEMORY_STORAGE.to_string(),
                ..StorageSettings::default()
            },
            ..Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let settings: Settings = Settings::figment("missing.toml").extract()?;
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.server.rpc_addr(), "0.0.0.0:1099");
            assert_eq!(settings.server.notify_addr(), "0.0.0.0:9090");
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "inventory-hub.toml",
                r#"
                [server]
                rpc_port = 2000

                [storage]
                url = "memory"

                [notifier]
                write_timeout_ms = 250
                "#,
            )?;
            jail.set_env("INVENTORY_SERVER__RPC_PORT", "3000");
            jail.set_env("INVENTORY_TELEMETRY__LOG_LEVEL", "debug");

            let settings: Settings = Settings::figment("inventory-hub.toml").extract()?;
            assert_eq!(settings.server.rpc_port, 3000);
            assert_eq!(settings.server.notify_port, 9090);
            assert!(settings.storage.is_memory());
            assert_eq!(settings.notifier.write_timeout(), Duration::from_millis(250));
            assert_eq!(settings.notifier.queue_capacity, 64);
            assert_eq!(settings.telemetry.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_bad_value_is_a_load_error() {
        Jail::expect_with(|jail| {
            jail.set_env("INVENTORY_SERVER__RPC_PORT", "not-a-port");
            assert!(matches!(
                Settings::load("missing.toml"),
                Err(ConfigError::Load(_))
            ));
            Ok(())
        });
    }
}
