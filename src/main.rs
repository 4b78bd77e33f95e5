//! CLI entry point for the battle analytics dashboard.
//!
//! Provides subcommands for a one-off dashboard refresh and for a refresh
//! loop that records each round to a CSV history file.

use anyhow::Result;
use battle_analytics::{
    analytics::AnalyticsAggregator,
    config::{AnalyticsConfig, StoreConfig},
    models::DashboardSnapshot,
    output::{append_record, print_json, print_pretty, render_text},
    store::{ApiKey, BasicClient, DataStore, RestStore},
};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "battle_analytics")]
#[command(about = "Voting analytics for audio clip battles", long_about = None)]
struct Cli {
    /// JSON file with analytics settings
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    /// Bucket votes into days at this UTC offset instead of local time
    #[arg(long, global = true, allow_hyphen_values = true)]
    utc_offset_minutes: Option<i32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the dashboard once and print it
    Dashboard {
        /// Print the snapshot as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,

        /// CSV file to append the headline numbers to
        #[arg(short, long)]
        output: Option<String>,

        /// Give up on the refresh after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Recompute the dashboard on an interval
    Watch {
        /// Seconds between refreshes
        #[arg(short = 'r', long, default_value_t = 60)]
        interval_secs: u64,

        /// Number of refreshes (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        num_samples: usize,

        /// CSV file to append each refresh to
        #[arg(short, long, default_value = "dashboard_history.csv")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/battle_analytics.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("battle_analytics.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut analytics_config = match &cli.config {
        Some(path) => AnalyticsConfig::load(path)?,
        None => AnalyticsConfig::default(),
    };
    if cli.utc_offset_minutes.is_some() {
        analytics_config.utc_offset_minutes = cli.utc_offset_minutes;
        analytics_config.validate()?;
    }

    let store_config = StoreConfig::from_env()?;
    info!(url = %store_config.url, "Connecting to store");
    let client = ApiKey::gateway(BasicClient::new()?, &store_config.api_key)?;
    let store = RestStore::new(&store_config.url, client)?;
    let aggregator = AnalyticsAggregator::new(store, &analytics_config)?;

    match cli.command {
        Commands::Dashboard {
            json,
            output,
            timeout_secs,
        } => {
            let snapshot = match timeout_secs {
                Some(secs) => {
                    match tokio::time::timeout(Duration::from_secs(secs), aggregator.compute())
                        .await
                    {
                        Ok(snapshot) => snapshot,
                        Err(_) => {
                            warn!(
                                timeout_secs = secs,
                                "Refresh timed out, showing empty dashboard"
                            );
                            DashboardSnapshot::default()
                        }
                    }
                }
                None => aggregator.compute().await,
            };

            print_pretty(&snapshot);
            if json {
                print_json(&snapshot)?;
            } else {
                println!("{}", render_text(&snapshot));
            }

            if let Some(path) = output {
                append_record(&path, &snapshot)?;
            }
        }
        Commands::Watch {
            interval_secs,
            num_samples,
            output,
        } => {
            watch_dashboard(&aggregator, interval_secs, num_samples, &output).await?;
        }
    }

    Ok(())
}

/// Refreshes the dashboard every `interval_secs`, printing each populated
/// snapshot and appending it to the CSV history at `output`.
#[tracing::instrument(skip(aggregator))]
async fn watch_dashboard<S: DataStore>(
    aggregator: &AnalyticsAggregator<S>,
    interval_secs: u64,
    num_samples: usize,
    output: &str,
) -> Result<()> {
    let (state, mut updates) = watch::channel(DashboardSnapshot::loading());

    let output_path = output.to_string();
    let renderer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if snapshot.loading {
                continue;
            }
            println!("{}", render_text(&snapshot));
            if let Err(e) = append_record(&output_path, &snapshot) {
                error!(path = %output_path, error = %e, "Failed to append dashboard history");
            }
        }
    });

    if num_samples == 0 {
        info!(interval_secs, "Refreshing indefinitely. Press Ctrl+C to stop.");
    } else {
        info!(num_samples, interval_secs, "Starting refresh loop");
    }

    let mut sample_count = 0;
    loop {
        // Check if we've reached the sample limit (0 = infinite)
        if num_samples > 0 && sample_count >= num_samples {
            break;
        }
        sample_count += 1;

        info!(sample = sample_count, "Refreshing dashboard");
        aggregator.refresh(&state).await;

        if num_samples == 0 || sample_count < num_samples {
            tokio::time::sleep(Duration::from_secs(interval_secs)).await;
        }
    }

    // Closing the channel lets the renderer drain the last snapshot and exit.
    drop(state);
    renderer.await?;

    info!(output, "Finished refreshing");
    Ok(())
}
