// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! HomeWatch - headless home-monitoring service

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use homewatch::{Config, DetectorKind, Monitor, NAME, VERSION};

/// HomeWatch - home monitoring and alerting
#[derive(Parser, Debug)]
#[command(name = "homewatch")]
#[command(author = "bad-antics")]
#[command(version = VERSION)]
#[command(about = "Concurrent home monitoring with armed/disarmed alerting")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Event database path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Static image (.jpg/.png/.bmp/.ppm) or a directory of frames
    #[arg(long)]
    source: Option<PathBuf>,

    /// Detector: classifier, simulated or differencing
    #[arg(long)]
    detector: Option<DetectorKind>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Start armed
    #[arg(long)]
    arm: bool,

    /// Seconds between status lines
    #[arg(long, default_value = "30")]
    status_interval: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Config loading logs its own warnings, so give it a temporary subscriber
    // until the configured level is known.
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let bootstrap = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    let mut config =
        tracing::subscriber::with_default(bootstrap, || Config::load_or_default(&config_path));

    let filter = if args.trace {
        EnvFilter::new("trace")
    } else if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{} v{}", NAME, VERSION);

    // Override with command line args
    if let Some(db) = args.db {
        config.database.path = db;
    }
    if let Some(source) = args.source {
        config.source.path = Some(source);
    }
    if let Some(kind) = args.detector {
        config.detector.kind = kind;
    }

    info!("Configuration: {:?}", config_path);
    info!("Detector: {}", config.detector.kind);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_headless(config, args.arm, Duration::from_secs(args.status_interval.max(1))))
}

/// Run both loops until Ctrl+C
async fn run_headless(config: Config, arm: bool, status_interval: Duration) -> Result<()> {
    let mut monitor = Monitor::new(config)?;

    if arm {
        monitor.toggle_armed_state();
    }
    monitor.start()?;

    info!("{} running. Press Ctrl+C to shut down", NAME);

    let mut ticker = tokio::time::interval(status_interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            _ = ticker.tick() => {
                let status = monitor.status();
                info!(
                    "Status: {} | {} sensors | {} polls | {} frames | human: {} | source: {}",
                    status.armed,
                    status.sensors_active,
                    status.poll_cycles,
                    status.frames_processed,
                    status.human_detected,
                    status.active_source.as_deref().unwrap_or("none"),
                );
            }
        }
    }

    info!("Shutdown signal received, cleaning up...");
    monitor.stop().await;
    info!("{} shutdown complete (uptime {}s)", NAME, monitor.uptime());

    Ok(())
}
