use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use kline_drawer::api::TushareClient;
use kline_drawer::backend::CandleBackend;
use kline_drawer::config::ProviderConfig;
use kline_drawer::models::RawChartRequest;
use kline_drawer::services::series_service;
use kline_drawer::{render_raw, ChartError};

#[derive(Parser, Debug)]
#[command(name = "kline-drawer", version, about = "Draw a candlestick chart for a stock")]
struct Cli {
    /// Stock code, e.g. 000001.SZ
    #[arg(required_unless_present = "request")]
    code: Option<String>,

    /// First date to plot
    #[arg(required_unless_present = "request")]
    start: Option<String>,

    /// Last date to plot
    #[arg(required_unless_present = "request")]
    end: Option<String>,

    /// Read the whole request from a JSON file instead
    #[arg(long, conflicts_with_all = ["code", "start", "end"])]
    request: Option<PathBuf>,

    /// CSV price data to plot instead of fetching from Tushare
    #[arg(long)]
    data: Option<PathBuf>,

    /// Output PNG path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Date to mark with a vertical line (repeatable)
    #[arg(long = "vline")]
    vlines: Vec<String>,

    /// Color for the vertical line at the same position (repeatable)
    #[arg(long = "vline-color")]
    vline_colors: Vec<String>,

    /// JSON file with `marks`, and optionally `sizes` and `colors`
    #[arg(long)]
    markers: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct MarkersFile {
    marks: Value,
    #[serde(default)]
    sizes: Option<Value>,
    #[serde(default)]
    colors: Option<Value>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ChartError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| ChartError::Type(format!("{} is not a valid JSON file: {}", path.display(), e)))
}

fn build_request(cli: Cli) -> Result<RawChartRequest, ChartError> {
    let mut raw = match &cli.request {
        Some(path) => read_json::<RawChartRequest>(path)?,
        None => RawChartRequest::new(
            cli.code.as_deref().unwrap_or_default(),
            cli.start.clone().unwrap_or_default(),
            cli.end.clone().unwrap_or_default(),
        ),
    };

    if let Some(path) = &cli.data {
        let table = series_service::load_csv(path)?;
        debug!("Loaded {} rows from {}", table.rows.len(), path.display());
        raw.kdata = Some(serde_json::to_value(table).map_err(|e| ChartError::Type(e.to_string()))?);
    }
    if let Some(output) = cli.output {
        raw.save_path = Some(output);
    }
    if !cli.vlines.is_empty() {
        raw.vlines_dates = Some(Value::from(cli.vlines));
        raw.vlines_colors = if cli.vline_colors.is_empty() {
            None
        } else {
            Some(Value::from(cli.vline_colors))
        };
    }
    if let Some(path) = &cli.markers {
        let markers: MarkersFile = read_json(path)?;
        raw.mark_list_dict = Some(markers.marks);
        raw.mark_list_sizes = markers.sizes;
        raw.mark_list_colors = markers.colors;
    }

    Ok(raw)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kline_drawer=info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let raw = match build_request(cli) {
        Ok(raw) => raw,
        Err(e) => {
            error!("Invalid request ({:?}): {}", e.kind(), e);
            return ExitCode::FAILURE;
        }
    };

    let config = ProviderConfig::from_env();
    let client = TushareClient::from_config(&config);
    info!("Using price provider at {}", config.base_url);

    match render_raw(&client, &CandleBackend, raw).await {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to draw chart ({:?}): {}", e.kind(), e);
            ExitCode::FAILURE
        }
    }
}
