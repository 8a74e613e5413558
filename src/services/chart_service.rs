use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::api::PriceProvider;
use crate::backend::{ChartBackend, Figure, GridStyle, Which};
use crate::models::chart::{
    ChartConfig, ChartKind, LineStyle, OverlayLayer, VerticalLineSpec, CHART_STYLE, FIGURE_SIZE,
    SAVE_DPI,
};
use crate::models::request::{ChartRequest, RawChartRequest};
use crate::services::{overlay_service, request_service, series_service};
use crate::utils::errors::ChartError;

/// Major x ticks every this many trading days
const MAJOR_TICK_EVERY: usize = 5;
const MINOR_TICK_EVERY: usize = 1;

/// `{code}_{start:%Y%m%d}_{end:%Y%m%d}.png`
pub fn default_save_path(stock_code: &str, start: NaiveDate, end: NaiveDate) -> PathBuf {
    PathBuf::from(format!(
        "{}_{}_{}.png",
        stock_code,
        start.format("%Y%m%d"),
        end.format("%Y%m%d")
    ))
}

/// Fixed candlestick configuration with optional overlays
///
/// Vertical lines and overlay layers are only attached when there is
/// something to draw.
pub fn build_chart_config(
    vlines: Option<VerticalLineSpec>,
    layers: Vec<OverlayLayer>,
) -> ChartConfig {
    ChartConfig {
        kind: ChartKind::Candle,
        style: CHART_STYLE.to_string(),
        volume: true,
        figsize: FIGURE_SIZE,
        vlines: vlines.filter(|spec| !spec.dates.is_empty()),
        addplot: if layers.is_empty() { None } else { Some(layers) },
        return_fig: true,
    }
}

pub fn major_grid_style() -> GridStyle {
    GridStyle {
        line_style: LineStyle::Dashed,
        width: 0.5,
        color: "gray".to_string(),
        alpha: 0.3,
    }
}

pub fn minor_grid_style() -> GridStyle {
    GridStyle {
        line_style: LineStyle::Dotted,
        width: 0.5,
        color: "gray".to_string(),
        alpha: 0.2,
    }
}

/// Grid lines and trading-day tick spacing on every panel
pub fn style_axes(figure: &mut Figure) {
    for axes in figure.axes_mut() {
        axes.grid(Which::Major, major_grid_style());
        axes.grid(Which::Minor, minor_grid_style());
        axes.minorticks_on();
        axes.set_x_major_locator(MAJOR_TICK_EVERY);
        axes.set_x_minor_locator(MINOR_TICK_EVERY);
    }
}

/// Render a candlestick chart for `request` and save it as a PNG
///
/// All request validation happens before the provider or the backend is
/// touched. Returns the path the chart was written to.
pub async fn render<P: PriceProvider, B: ChartBackend>(
    provider: &P,
    backend: &B,
    request: ChartRequest,
) -> Result<PathBuf, ChartError> {
    request_service::validate(&request)?;

    let ChartRequest {
        stock_code,
        start_date,
        end_date,
        kdata,
        save_path,
        vlines,
        markers,
    } = request;

    info!(
        "📈 Rendering {} from {} to {}",
        stock_code, start_date, end_date
    );

    let series =
        series_service::resolve_series(provider, &stock_code, start_date, end_date, kdata).await?;

    let save_path = save_path.unwrap_or_else(|| default_save_path(&stock_code, start_date, end_date));

    let vlines = overlay_service::vertical_line_spec(vlines);
    let layers = overlay_service::marker_layers(&markers, &series)?;
    debug!(
        "{} vertical lines, {} marker layers",
        vlines.as_ref().map_or(0, |v| v.dates.len()),
        layers.len()
    );

    let config = build_chart_config(vlines, layers);

    let mut figure = backend.plot(&series, &config)?;
    style_axes(&mut figure);
    backend.save(&figure, &save_path, SAVE_DPI, true)?;

    info!("✅ Chart saved to {}", save_path.display());
    Ok(save_path)
}

/// Validate a caller-shaped request, then [`render`] it
pub async fn render_raw<P: PriceProvider, B: ChartBackend>(
    provider: &P,
    backend: &B,
    raw: RawChartRequest,
) -> Result<PathBuf, ChartError> {
    let request = request_service::normalize(raw)?;
    render(provider, backend, request).await
}
