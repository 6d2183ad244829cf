//! Votewave - touch-session tracking for physical voting stations
//!
//! Receives touch events from station firmware over UDP, tracks one
//! touch session per station key, maps touch duration to a bubble radius,
//! and reports results to the rendering collaborator.
//!
//! Module structure:
//! - `domain/` - Core types (Station, TouchSession, RadiusMap)
//! - `io/` - External interfaces (UDP, station file, vote log, emissions)
//! - `services/` - Business logic (StationIndex, TouchTracker)
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use votewave::infra::{Config, EmitMode, Metrics};
use votewave::io::{create_emit_channel, start_udp_listener, BubbleWriter, UdpListenerConfig};
use votewave::services::{StationIndex, TouchTracker};

/// Votewave - voting station touch tracker
#[derive(Parser, Debug)]
#[command(name = "votewave", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("votewave starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    let emit_mode_str = match config.emit_mode() {
        EmitMode::Coordinates => "coordinates",
        EmitMode::IdOnly => "id_only",
    };
    info!(
        config_file = %config.config_file(),
        stations_file = %config.stations_file(),
        udp_port = %config.udp_port(),
        max_duration_ms = %config.max_duration_ms(),
        min_radius = %config.min_radius(),
        max_radius = %config.max_radius(),
        emit_mode = %emit_mode_str,
        "config_loaded"
    );

    // Build the station index once, before any event is processed
    let records = votewave::io::stations::load_stations(config.stations_file())?;
    let stations = StationIndex::build(records, config.on_duplicate())?;
    info!(stations = %stations.len(), sources = ?stations.sources(), "station_index_built");

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics = Arc::new(Metrics::new());

    // Create event channel (bounded for backpressure)
    let (event_tx, event_rx) = mpsc::channel(1000);

    // Start UDP listener for station firmware messages
    let udp_config = UdpListenerConfig { port: config.udp_port(), enabled: config.udp_enabled() };
    let udp_metrics = metrics.clone();
    let udp_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = start_udp_listener(udp_config, event_tx, udp_metrics, udp_shutdown).await {
            tracing::error!(error = %e, "UDP listener error");
        }
    });

    // Start metrics reporter
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            // Open-touch count lives in the tracker; report channel-side counters
            let summary = metrics_clone.report(0);
            summary.log();
        }
    });

    // Create emit channel and bubble writer (if enabled)
    let emit_sender = if config.emit_enabled() {
        let (emit_sender, emit_rx) = create_emit_channel(1000, metrics.clone());

        let writer = BubbleWriter::new(config.emit_file(), emit_rx);
        let writer_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            writer.run(writer_shutdown).await;
        });

        Some(emit_sender)
    } else {
        None
    };

    // Start tracker (main event processing loop)
    let mut tracker = TouchTracker::new(config, stations, metrics, emit_sender);
    info!("tracker_started");

    // Handle shutdown on Ctrl+C
    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    // Run tracker - consumes events until the channel closes
    tracker.run(event_rx).await;

    info!("votewave shutdown complete");
    Ok(())
}
