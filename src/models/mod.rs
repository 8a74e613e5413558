//! Data models shared by the services and the chart backend

pub mod chart;
pub mod price;
pub mod request;

pub use chart::{ChartConfig, ChartKind, LineStyle, MarkerShape, OverlayLayer, VerticalLineSpec};
pub use price::{Candle, PriceSeries, RawPriceTable, REQUIRED_COLUMNS};
pub use request::{ChartRequest, DateInput, MarkerSeries, RawChartRequest, VerticalLines};
