//! # Tracing
//!
//! Structured logging for the whole server through `tracing`.
//!
//! Log lines are compact and omit the module prefix. `RUST_LOG` wins when set; otherwise the
//! configured `telemetry.log_level` applies.
//!
//! ```bash
//! # Every request, sale and observer event
//! RUST_LOG=debug inventory-hub
//!
//! # Only the store actor's decisions
//! RUST_LOG=inventory_hub::store=debug inventory-hub
//! ```
//!
//! Sales log `product_id` and `remaining` as fields; observer events carry
//! `observer` and `peer`.

use tracing_subscriber::EnvFilter;

pub fn setup_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
