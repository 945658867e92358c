//! CLI entry point for the mission emissions tool.
//!
//! Builds (or loads from cache) the enriched mission dataset, then exports
//! per-region cumulative emission series, logs regional totals, or shows
//! them as an interactive terminal chart.

#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mission_emissions::analyzers::aggregate::{cumulative_emissions, region_totals};
use mission_emissions::analyzers::selection::ModeSelection;
use mission_emissions::analyzers::types::ChartData;
use mission_emissions::config::DataPaths;
use mission_emissions::loader::{LoadedDataset, load_or_build, rebuild};
use mission_emissions::output::write_json;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "mission_emissions")]
#[command(about = "Cumulative mission emissions per region", long_about = None)]
struct Cli {
    /// Directory holding the raw tables and the cache (defaults to $DATA_DIR, then "Data")
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Rebuild the cache from the raw tables even if it exists
    #[arg(long, global = true, default_value_t = false)]
    rebuild: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the cached dataset, or build it from the raw tables
    Build,
    /// Write per-region cumulative emission series as JSON
    Series {
        /// Comma-separated travel modes to include
        #[arg(short, long, default_value = "public,car,train,plane")]
        modes: ModeSelection,

        /// JSON file to write
        #[arg(short, long, default_value = "series.json")]
        output: PathBuf,
    },
    /// Log total emissions per region
    Summary {
        /// Comma-separated travel modes to include
        #[arg(short, long, default_value = "public,car,train,plane")]
        modes: ModeSelection,
    },
    /// Interactive cumulative emissions chart with a travel mode checklist
    Chart {
        /// Travel modes checked at start
        #[arg(short, long, default_value = "public,car,train,plane")]
        modes: ModeSelection,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/mission_emissions.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("mission_emissions.log"));

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
    let paths = DataPaths::resolve(cli.data_dir.as_deref());
    let dataset = load_dataset(&paths, cli.rebuild)?;

    match cli.command {
        Commands::Build => {
            info!(
                trips = dataset.trips.len(),
                columns = dataset.columns.len(),
                source = ?dataset.source,
                cache = %paths.cache.display(),
                "Dataset ready"
            );
        }
        Commands::Series { modes, output } => {
            if modes.is_empty() {
                warn!("No travel mode selected, the series will be empty");
            }
            let series = cumulative_emissions(&dataset.trips, &modes);
            info!(regions = series.len(), modes = %modes, "Series computed");
            write_json(&output, &ChartData::new(modes, series))?;
        }
        Commands::Summary { modes } => {
            let totals = region_totals(&dataset.trips, &modes);
            for total in &totals {
                info!(
                    region = %total.region,
                    trips = total.trips,
                    emissions = total.total,
                    "Region"
                );
            }

            let grand_total: f64 = totals.iter().map(|t| t.total).sum();
            info!(
                regions = totals.len(),
                modes = %modes,
                emissions = grand_total,
                "Emission summary"
            );
        }
        Commands::Chart { modes } => {
            run_chart(dataset, modes)?;
        }
    }

    Ok(())
}

/// Loads the dataset through the cache, or rebuilds it when asked to.
fn load_dataset(paths: &DataPaths, force_rebuild: bool) -> Result<LoadedDataset> {
    let dataset = if force_rebuild {
        rebuild(&paths.cache, &paths.raw)?
    } else {
        load_or_build(&paths.cache, &paths.raw)?
    };

    if let Some(report) = &dataset.report {
        if !report.is_clean() {
            warn!(
                missing_places = report.missing_places,
                missing_users = report.missing_users,
                defaulted_placeholders = report.defaulted_placeholders,
                "Some missions could not be fully joined"
            );
        }
    }

    Ok(dataset)
}

#[cfg(feature = "tui")]
fn run_chart(dataset: LoadedDataset, modes: ModeSelection) -> Result<()> {
    let mut app = ui::App::new(dataset.trips, modes);
    ui::run_ui(&mut app)?;
    info!("Chart closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_chart(_dataset: LoadedDataset, _modes: ModeSelection) -> Result<()> {
    anyhow::bail!("terminal chart not available, rebuild with `--features tui`")
}
