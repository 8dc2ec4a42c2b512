//! Predictive autoscaler - simulated memory autoscaling control loop
//!
//! Spawns a fleet of simulated nodes, feeds their usage into a forecasting
//! controller that resizes capacity ahead of demand, and prints the final
//! fleet state on shutdown.

use anyhow::{Context, Result};
use autoscaler_lib::{
    fleet::Fleet,
    health::HealthRegistry,
    observability::StructuredLogger,
    reporter::FleetStatus,
    runtime::Autoscaler,
    source::SyntheticWorkload,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const AUTOSCALER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting autoscaler");

    let config = config::AutoscalerConfig::load()?;
    info!(
        instance = %config.instance,
        nodes = config.node_count,
        seed = ?config.seed,
        "Autoscaler configured"
    );

    let mut rng = config
        .seed
        .map(fastrand::Rng::with_seed)
        .unwrap_or_else(fastrand::Rng::new);
    let fleet = Arc::new(Fleet::generate(config.node_count, &mut rng));
    let source = Arc::new(SyntheticWorkload::new(rng));

    let health_registry = HealthRegistry::new();
    let logger = StructuredLogger::new(&config.instance);
    let runtime_config = config.runtime_config();
    logger.log_startup(
        AUTOSCALER_VERSION,
        fleet.len(),
        runtime_config.strategy.build().name(),
    );

    let autoscaler = Autoscaler::start(
        fleet.clone(),
        source,
        runtime_config,
        health_registry.clone(),
        logger.clone(),
    )
    .await
    .context("Failed to start control loop")?;

    if config.api_port != 0 {
        let app_state = Arc::new(api::AppState::new(
            health_registry.clone(),
            fleet.clone(),
            autoscaler.store().clone(),
        ));
        let port = config.api_port;
        tokio::spawn(async move {
            if let Err(e) = api::serve(port, app_state).await {
                error!(error = %e, "API server stopped");
            }
        });
    }

    // Mark ready once every task is running
    health_registry.set_ready(true).await;

    let reason = match config.run_duration() {
        Some(duration) => tokio::select! {
            _ = tokio::time::sleep(duration) => "run duration elapsed",
            signal = tokio::signal::ctrl_c() => {
                signal?;
                "SIGINT received"
            }
        },
        None => {
            tokio::signal::ctrl_c().await?;
            "SIGINT received"
        }
    };
    logger.log_shutdown(reason);

    let stats = autoscaler.stats().await;
    let final_state = autoscaler.shutdown().await;
    info!(
        ticks = stats.ticks,
        samples = stats.samples_recorded,
        resizes = stats.resizes_applied,
        nodes = final_state.len(),
        "Control loop stopped"
    );

    print!("{}", FleetStatus::collect(&fleet).await.render());

    Ok(())
}
