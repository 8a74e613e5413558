//! Candlestick chart rendering for daily stock prices
//!
//! A [`RawChartRequest`](models::RawChartRequest) is validated into a typed
//! [`ChartRequest`](models::ChartRequest), price data is taken from the
//! request or fetched from a [`PriceProvider`](api::PriceProvider), and the
//! chart is drawn to a PNG by a [`ChartBackend`](backend::ChartBackend).

pub mod api;
pub mod backend;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use services::chart_service::{render, render_raw};
pub use utils::errors::{ChartError, ErrorKind};
