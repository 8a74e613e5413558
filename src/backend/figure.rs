//! Figure model handed back by [`super::ChartBackend::plot`]
//!
//! A figure holds everything needed to draw the chart, plus one [`Axes`] per
//! panel whose grid and tick settings can be changed before it is saved.

use chrono::NaiveDate;

use super::style::{ChartStyle, Rgb};
use crate::models::chart::{LineStyle, MarkerShape};
use crate::models::price::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Which {
    Major,
    Minor,
}

/// Grid line appearance; `width` is in points
#[derive(Debug, Clone, PartialEq)]
pub struct GridStyle {
    pub line_style: LineStyle,
    pub width: f64,
    pub color: String,
    pub alpha: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxesRole {
    Price,
    Volume,
}

/// One panel of the figure
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub role: AxesRole,
    pub major_grid: Option<GridStyle>,
    pub minor_grid: Option<GridStyle>,
    pub minor_ticks: bool,
    /// Major tick spacing along x, in trading days
    pub x_major_every: Option<usize>,
    /// Minor tick spacing along x, in trading days
    pub x_minor_every: Option<usize>,
}

impl Axes {
    pub fn new(role: AxesRole) -> Self {
        Self {
            role,
            major_grid: None,
            minor_grid: None,
            minor_ticks: false,
            x_major_every: None,
            x_minor_every: None,
        }
    }

    pub fn grid(&mut self, which: Which, style: GridStyle) {
        match which {
            Which::Major => self.major_grid = Some(style),
            Which::Minor => self.minor_grid = Some(style),
        }
    }

    pub fn minorticks_on(&mut self) {
        self.minor_ticks = true;
    }

    pub fn set_x_major_locator(&mut self, every: usize) {
        self.x_major_every = Some(every.max(1));
    }

    pub fn set_x_minor_locator(&mut self, every: usize) {
        self.x_minor_every = Some(every.max(1));
    }
}

/// A vertical line resolved to an x position on the trading-day axis
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub date: NaiveDate,
    pub position: f64,
    pub color: Rgb,
    pub line_style: LineStyle,
}

/// A scatter layer with its points resolved to (day position, price)
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarkers {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub shape: MarkerShape,
    /// Marker area in points squared
    pub size: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    /// Width and height in inches
    pub size: (f64, f64),
    pub style: ChartStyle,
    pub series: PriceSeries,
    pub vlines: Vec<PlacedLine>,
    pub markers: Vec<PlacedMarkers>,
    pub axes: Vec<Axes>,
}

impl Figure {
    pub fn axes_mut(&mut self) -> impl Iterator<Item = &mut Axes> {
        self.axes.iter_mut()
    }

    /// Output size in pixels at `dpi`
    pub fn pixel_size(&self, dpi: u32) -> (u32, u32) {
        let (w, h) = self.size;
        (
            (w * dpi as f64).round() as u32,
            (h * dpi as f64).round() as u32,
        )
    }
}

/// Position of `date` on the trading-day axis
///
/// Exact trading days map to their index; dates falling between two trading
/// days are interpolated by calendar distance. Dates outside the series have
/// no position. `dates` must be ascending.
pub fn date_position(dates: &[NaiveDate], date: NaiveDate) -> Option<f64> {
    let idx = dates.partition_point(|d| *d < date);
    if idx < dates.len() && dates[idx] == date {
        return Some(idx as f64);
    }
    if idx == 0 || idx == dates.len() {
        return None;
    }

    let (prev, next) = (dates[idx - 1], dates[idx]);
    let span = (next - prev).num_days() as f64;
    let offset = (date - prev).num_days() as f64;
    Some(idx as f64 - 1.0 + offset / span)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_position_on_trading_days() {
        // Friday, Monday, Tuesday
        let dates = vec![ymd(2024, 1, 5), ymd(2024, 1, 8), ymd(2024, 1, 9)];
        assert_eq!(date_position(&dates, ymd(2024, 1, 5)), Some(0.0));
        assert_eq!(date_position(&dates, ymd(2024, 1, 9)), Some(2.0));
    }

    #[test]
    fn test_date_position_interpolates_weekend() {
        let dates = vec![ymd(2024, 1, 5), ymd(2024, 1, 8)];
        assert_eq!(date_position(&dates, ymd(2024, 1, 6)), Some(1.0 / 3.0));
    }

    #[test]
    fn test_date_position_outside_range() {
        let dates = vec![ymd(2024, 1, 5), ymd(2024, 1, 8)];
        assert_eq!(date_position(&dates, ymd(2024, 1, 4)), None);
        assert_eq!(date_position(&dates, ymd(2024, 1, 9)), None);
        assert_eq!(date_position(&[], ymd(2024, 1, 9)), None);
    }

    #[test]
    fn test_axes_locators_never_zero() {
        let mut axes = Axes::new(AxesRole::Price);
        axes.set_x_major_locator(0);
        axes.minorticks_on();
        assert_eq!(axes.x_major_every, Some(1));
        assert!(axes.minor_ticks);
    }
}
