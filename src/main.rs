use anyhow::Context;
use inventory_hub::lifecycle::{setup_tracing, ServiceHost, Settings};
use tracing::{error, info};

const DEFAULT_CONFIG: &str = "inventory-hub.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::var("INVENTORY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let settings = Settings::load(&path).with_context(|| format!("loading {path}"))?;
    setup_tracing(&settings.telemetry.log_level);

    let host = match ServiceHost::start(&settings).await {
        Ok(host) => host,
        Err(e) => {
            error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    info!("Ctrl-C received");

    host.shutdown().await?;
    Ok(())
}
