//! External price-data providers

use chrono::NaiveDate;

use crate::models::price::PriceSeries;

pub mod tushare;

pub use tushare::{ApiError, TushareClient};

/// Source of daily price series when the caller does not supply one
#[allow(async_fn_in_trait)]
pub trait PriceProvider {
    /// Daily bars for `stock_code` in `[start, end]`, indexed by trade date
    async fn load_data(
        &self,
        stock_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ApiError>;
}
