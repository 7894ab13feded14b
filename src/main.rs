//! Trekline - Location Tracking Core
//!
//! Command line entry point: replays a recorded GPX track through the
//! tracker as if it were a live position stream, then prints the derived
//! statistics and, on request, a journal entry.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trekline::narrative::{GeminiClient, NarrativeService};
use trekline::position::GpxReplaySource;
use trekline::stats::{self, AltitudeRange, SummaryContext};
use trekline::storage::config::{self, AppConfig};
use trekline::tracking::SessionStore;

#[derive(Parser, Debug)]
#[command(name = "trekline")]
#[command(about = "Track a trip, chart its elevation and write a journal entry")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the platform data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a GPX file as a live tracking session
    Replay {
        /// GPX file to replay
        input: PathBuf,

        /// Delay between fixes in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Take every Nth sample for the elevation chart
        #[arg(long)]
        stride: Option<usize>,

        /// Ask the generative API for a journal entry afterwards
        #[arg(long)]
        journal: bool,
    },
    /// Show the configuration in use
    Config {
        /// Write the current configuration to disk
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Trekline v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::get_config_path);
    let app_config = config::load_config_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match cli.command {
        Commands::Replay {
            input,
            interval_ms,
            stride,
            journal,
        } => run_replay(&app_config, input, interval_ms, stride, journal).await,
        Commands::Config { save } => {
            if save {
                config::save_config_to(&app_config, &config_path)?;
                println!("Saved {}", config_path.display());
            }
            print!("{}", toml::to_string_pretty(&app_config)?);
            Ok(())
        }
    }
}

async fn run_replay(
    app_config: &AppConfig,
    input: PathBuf,
    interval_ms: Option<u64>,
    stride: Option<usize>,
    journal: bool,
) -> Result<()> {
    let settings = &app_config.tracking;
    let interval = interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| settings.replay_interval());
    let stride = stride.unwrap_or(settings.chart_stride);

    let source = GpxReplaySource::from_path(&input, interval)
        .with_context(|| format!("reading {}", input.display()))?;
    let expected = source.len();

    let mut store = SessionStore::with_source(settings.watch_options(), Arc::new(source));
    store.start_tracking()?;

    let poll = interval.max(Duration::from_millis(50));
    let mut handled = 0;
    while handled < expected {
        tokio::time::sleep(poll).await;
        let report = store.pump();
        handled += report.recorded + report.discarded + report.rejected;

        if report.recorded > 0 {
            let altitude = store.session().and_then(stats::current_altitude);
            println!(
                "{:>5} samples  altitude {} m",
                store.session().map_or(0, |s| s.len()),
                stats::format_altitude(altitude)
            );
        }
    }

    let session = store.finalize_session()?.clone();

    println!();
    println!("Session {}", session.id());
    println!("  Samples:  {}", session.len());
    println!(
        "  Altitude: {} m (peak {} m)",
        stats::format_altitude(stats::current_altitude(&session)),
        stats::format_altitude(stats::peak_altitude(&session))
    );
    if store.rejected_count() > 0 {
        println!("  Rejected: {}", store.rejected_count());
    }

    match stats::summary_context(&session) {
        SummaryContext::Ready(summary) => {
            println!("  Duration: {:.1} min", summary.duration_minutes());
            if let AltitudeRange::Range { min, max } = summary.altitude {
                println!("  Range:    {:.1} m to {:.1} m", min, max);
            }
        }
        SummaryContext::InsufficientData { sample_count } => {
            println!("  Only {} samples, not enough for a summary", sample_count);
        }
    }

    println!();
    println!("Elevation profile (every {} samples):", stride.max(1));
    for point in stats::elevation_series(&session, stride) {
        println!("  #{:<5} {:>8.1} m  {:>5.1} m/s", point.index, point.altitude, point.speed);
    }

    if journal {
        let client = GeminiClient::from_settings(&app_config.narrative)?;
        tracing::info!("Requesting journal entry from {}", client.model());
        let mut narrative = NarrativeService::new(client);
        narrative.request(&session);
        if let Some(entry) = narrative.wait().await {
            entry.apply_to(&mut store)?;
            println!();
            println!("\"{}\"", entry.text);
        }
    }

    Ok(())
}
