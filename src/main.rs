use anyhow::{Context, Result};
use clap::Parser;
use dripwatch::config::AppConfig;
use dripwatch::core::WeightObservationService;
use dripwatch::ui::Dashboard;
use dripwatch_types::source_configs::SimulatedSensorConfig;
use log::{info, warn};
use std::path::PathBuf;

/// dripwatch - IV drip monitoring from a polled weight sensor
#[derive(Parser, Debug, Clone)]
#[command(name = "dripwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the weight sensor bridge (e.g. http://192.168.1.20:8000)
    #[arg(short = 'u', long = "base-url", value_name = "URL")]
    base_url: Option<String>,

    /// Poll interval in milliseconds
    #[arg(short = 'i', long = "interval", value_name = "MS")]
    interval: Option<u64>,

    /// Configuration file to load instead of the default location
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use a simulated draining bag instead of the sensor endpoint
    #[arg(short = 's', long = "simulate")]
    simulate: bool,

    /// Exit after every view has received its first observation
    #[arg(long = "once")]
    once: bool,

    /// Write the effective configuration to the default location and exit
    #[arg(long = "save-config")]
    save_config: bool,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    warn!("Starting dripwatch v{}", env!("CARGO_PKG_VERSION"));

    let config = effective_config(&cli)?;

    if cli.save_config {
        config.save()?;
        println!("Saved configuration to {}", AppConfig::config_path()?.display());
        return Ok(());
    }

    config.validate()?;

    // Single-threaded event loop: ticks, manual refreshes and rendering interleave
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(run(config, cli.once))
}

/// Load the configuration file and apply command line overrides
fn effective_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };

    if let Some(base_url) = &cli.base_url {
        config.sensor.base_url = base_url.clone();
    }
    if let Some(interval) = cli.interval {
        config.sensor.poll_interval_ms = interval;
    }
    if cli.simulate && config.simulation.is_none() {
        config.simulation = Some(SimulatedSensorConfig::default());
    }

    Ok(config)
}

async fn run(config: AppConfig, once: bool) -> Result<()> {
    let client = dripwatch_sources::create_sensor_client(&config.sensor, config.simulation.as_ref())?;
    let service = WeightObservationService::new(client, config.sensor.poll_interval())?;
    let mut dashboard = Dashboard::new(&service, dripwatch_displayers::create_views(&config.views));

    info!(
        "Watching {} view(s), polling every {:?}",
        dashboard.panel_count(),
        service.poll_interval()
    );

    for line in dashboard.render_changed() {
        println!("{}", line);
    }

    loop {
        tokio::select! {
            changed = dashboard.next_change() => {
                if !changed {
                    break;
                }
                for line in dashboard.render_changed() {
                    println!("{}", line);
                }
                if once && dashboard.all_settled() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    dashboard.close();
    service.shutdown();
    Ok(())
}
