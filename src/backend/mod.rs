//! Chart drawing backend
//!
//! `plot` turns a price series and a [`ChartConfig`] into a [`Figure`];
//! `save` rasterises a (possibly restyled) figure to a PNG file.

use std::path::Path;

use chrono::NaiveDate;

use crate::models::chart::ChartConfig;
use crate::models::price::PriceSeries;
use crate::utils::errors::ChartError;

pub mod candle;
pub mod figure;
pub mod style;

pub use figure::{Axes, AxesRole, Figure, GridStyle, PlacedLine, PlacedMarkers, Which};
pub use style::ChartStyle;

use figure::date_position;
use style::parse_color;

pub trait ChartBackend {
    /// Lay out a chart without drawing it
    fn plot(&self, series: &PriceSeries, config: &ChartConfig) -> Result<Figure, ChartError>;

    /// Draw `figure` to `path`; `tight` trims the outer margins to a minimum
    fn save(&self, figure: &Figure, path: &Path, dpi: u32, tight: bool) -> Result<(), ChartError>;
}

/// Candlestick backend drawing with plotters
#[derive(Debug, Clone, Copy, Default)]
pub struct CandleBackend;

impl ChartBackend for CandleBackend {
    fn plot(&self, series: &PriceSeries, config: &ChartConfig) -> Result<Figure, ChartError> {
        if series.is_empty() {
            return Err(ChartError::Backend("No price data to plot".to_string()));
        }
        let style = ChartStyle::named(&config.style)
            .ok_or_else(|| ChartError::Backend(format!("Unknown chart style '{}'", config.style)))?;

        let dates: Vec<NaiveDate> = series.dates().collect();

        let mut vlines = Vec::new();
        if let Some(spec) = &config.vlines {
            for (date, color) in spec.dates.iter().zip(&spec.colors) {
                let position = date_position(&dates, *date).ok_or_else(|| {
                    ChartError::Backend(format!("Vertical line date {} is outside the plotted data", date))
                })?;
                vlines.push(PlacedLine {
                    date: *date,
                    position,
                    color: resolve_color(color)?,
                    line_style: spec.line_style,
                });
            }
        }

        let mut markers = Vec::new();
        for layer in config.addplot.iter().flatten() {
            if layer.panel != 0 {
                return Err(ChartError::Backend(format!(
                    "Overlay '{}' targets unknown panel {}",
                    layer.label, layer.panel
                )));
            }
            markers.push(PlacedMarkers {
                label: layer.label.clone(),
                points: layer
                    .values
                    .iter()
                    .enumerate()
                    .filter_map(|(i, v)| v.map(|price| (i as f64, price)))
                    .collect(),
                shape: layer.marker,
                size: layer.size,
                color: resolve_color(&layer.color)?,
            });
        }

        let mut axes = vec![Axes::new(AxesRole::Price)];
        if config.volume {
            axes.push(Axes::new(AxesRole::Volume));
        }

        Ok(Figure {
            size: config.figsize,
            style,
            series: series.clone(),
            vlines,
            markers,
            axes,
        })
    }

    fn save(&self, figure: &Figure, path: &Path, dpi: u32, tight: bool) -> Result<(), ChartError> {
        candle::draw_png(figure, path, dpi, tight)
    }
}

fn resolve_color(name: &str) -> Result<style::Rgb, ChartError> {
    parse_color(name).ok_or_else(|| ChartError::Backend(format!("Unknown color '{}'", name)))
}
