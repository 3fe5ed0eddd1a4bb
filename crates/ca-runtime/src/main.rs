//! # CA Confirmation Runtime
//!
//! Runs the certificate confirmation subsystem: tracks issued certificates
//! until confirmed and sweeps those whose confirmation never arrives.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (from file/env)
//! 2. Initialize logging
//! 3. Build the confirmation service
//! 4. Spawn the sweeper
//! 5. Wait for Ctrl+C, then shut down gracefully

use anyhow::{Context, Result};
use ca_runtime::{init_logging, load_config, CaRuntime};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config().context("failed to load configuration")?;
    init_logging(&config.logging).context("failed to initialize logging")?;

    info!("===========================================");
    info!("  CA Confirmation Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let runtime = CaRuntime::new(config)?;
    runtime.start();

    info!("Confirmation subsystem running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    runtime.shutdown().await;
    Ok(())
}
