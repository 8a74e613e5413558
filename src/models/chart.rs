//! Chart configuration models

use chrono::NaiveDate;

/// Marker size applied to every series when the caller gives no size mapping
pub const DEFAULT_MARKER_SIZE: f64 = 10.0;
/// Marker color applied to every series when the caller gives no color mapping
pub const DEFAULT_MARKER_COLOR: &str = "blue";
/// Size used for a series that a supplied size mapping leaves out
pub const FALLBACK_MARKER_SIZE: f64 = 100.0;
/// Color used for a series that a supplied color mapping leaves out
pub const FALLBACK_MARKER_COLOR: &str = "purple";
pub const DEFAULT_VLINE_COLOR: &str = "red";

pub const CHART_STYLE: &str = "yahoo";
/// Figure size in inches (width, height)
pub const FIGURE_SIZE: (f64, f64) = (15.0, 8.0);
pub const SAVE_DPI: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Candle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl LineStyle {
    /// Alternating on/off run lengths as fractions of the line's span.
    /// Empty for a continuous line.
    pub fn pattern(&self) -> &'static [f64] {
        match self {
            LineStyle::Solid => &[],
            LineStyle::Dashed => &[0.010, 0.006],
            LineStyle::Dotted => &[0.002, 0.006],
            LineStyle::DashDot => &[0.012, 0.005, 0.002, 0.005],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    TriangleUp,
}

/// Vertical lines with one color per date
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalLineSpec {
    pub dates: Vec<NaiveDate>,
    pub colors: Vec<String>,
    pub line_style: LineStyle,
}

/// A scatter layer drawn on top of a panel
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    pub label: String,
    /// One entry per trading day; `None` draws nothing on that day
    pub values: Vec<Option<f64>>,
    pub marker: MarkerShape,
    /// Marker area in points squared
    pub size: f64,
    pub color: String,
    /// 0 is the price panel
    pub panel: usize,
}

/// Everything the backend needs besides the price series
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    /// Always candlesticks; there is no other chart kind to draw
    pub kind: ChartKind,
    pub style: String,
    pub volume: bool,
    pub figsize: (f64, f64),
    pub vlines: Option<VerticalLineSpec>,
    pub addplot: Option<Vec<OverlayLayer>>,
    /// Hand the figure back for post-processing instead of showing it
    pub return_fig: bool,
}
