//! # Quantum-Sentinel Runtime
//!
//! Entry point: telemetry, configuration, then the pipeline until Ctrl+C
//! (or until a configured job budget is spent).

use anyhow::{Context, Result};
use quantum_telemetry::{init_telemetry, TelemetryConfig};
use sentinel_runtime::config::RuntimeConfig;
use sentinel_runtime::SentinelRuntime;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .await
        .context("Failed to initialize telemetry")?;

    let config = RuntimeConfig::from_env().context("Invalid runtime configuration")?;
    let runtime = SentinelRuntime::new(config).context("Failed to build the pipeline")?;
    runtime.start().await.context("Failed to start the pipeline")?;

    info!("Sentinel is running. Press Ctrl+C to stop.");
    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal.context("Failed to listen for Ctrl+C")?,
        _ = runtime.jobs_finished() => info!("Job budget spent"),
    }

    runtime.shutdown().await;
    Ok(())
}
