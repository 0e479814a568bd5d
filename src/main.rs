// src/main.rs

mod actuator;
mod config;
mod controller;
mod dwell;
mod error;
mod events;
mod probe;
mod selector;
mod types;

use actuator::SerialActuator;
use anyhow::{Context, Result};
use config::Config;
use controller::{ControlLoop, LoopConfig};
use events::EventLog;
use probe::ReplayProbe;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("traffic_arbiter={}", config.logging.level))
        .init();

    info!("🚦 Traffic Signal Arbiter Starting");

    config
        .validate()
        .with_context(|| format!("invalid configuration in {}", config_path))?;
    info!(
        "✓ Configuration loaded: {} lane(s), primary = {} ({})",
        config.lanes.len(),
        config.primary_lane,
        config.lane_name(config.primary_lane).unwrap_or("?")
    );

    let probe = ReplayProbe::from_config(&config.probe);
    let actuator = SerialActuator::open(&config.serial.port, config.serial.baud_rate)?;

    let events = if config.events.save {
        Some(EventLog::create(&config.events.path)?)
    } else {
        None
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("🛑 Interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let controller = ControlLoop::new(
        config.lanes.clone(),
        config.primary_lane,
        LoopConfig::from_config(&config),
        probe,
        actuator,
        events,
        shutdown_rx,
    );

    controller.run().await
}
