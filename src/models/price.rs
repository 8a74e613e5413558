//! Price series models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Columns every supplied price table must carry
pub const REQUIRED_COLUMNS: [&str; 5] = ["Open", "High", "Low", "Close", "Volume"];

/// One trading day of OHLCV data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

/// Daily candles indexed by trading date
///
/// Drawing assumes ascending dates; series that reach a chart go through
/// [`PriceSeries::sorted`] or [`PriceSeries::into_sorted`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    candles: Vec<Candle>,
}

impl PriceSeries {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    /// Build a series sorted ascending by trading date
    pub fn sorted(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.date);
        Self { candles }
    }

    pub fn into_sorted(self) -> Self {
        Self::sorted(self.candles)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.candles.iter().map(|c| c.date)
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.candles.iter().map(|c| c.close)
    }

    /// Rows whose date lies within `[start, end]`, inclusive on both ends
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let candles = self
            .candles
            .iter()
            .filter(|c| c.date >= start && c.date <= end)
            .cloned()
            .collect();
        PriceSeries { candles }
    }

    /// Lowest low and highest high, or `None` for an empty series
    pub fn price_range(&self) -> Option<(f64, f64)> {
        if self.candles.is_empty() {
            return None;
        }
        let low = self.candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let high = self.candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        Some((low, high))
    }

    pub fn max_volume(&self) -> f64 {
        self.candles.iter().map(|c| c.volume).fold(0.0, f64::max)
    }
}

/// A loosely typed price table as read from CSV or a JSON request
///
/// Cells are kept as JSON values until the table is validated into a
/// [`PriceSeries`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPriceTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl RawPriceTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Required columns absent from the header, in canonical order
    pub fn missing_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|required| self.column_index(required).is_none())
            .map(|c| c.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(day: u32, close: f64) -> Candle {
        Candle {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close - 1.0,
            high: close + 2.0,
            low: close - 3.0,
            close,
            volume: 1000.0 * day as f64,
        }
    }

    #[test]
    fn test_between_is_inclusive() {
        let series = PriceSeries::new(vec![candle(2, 10.0), candle(3, 11.0), candle(4, 12.0), candle(5, 13.0)]);
        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();

        let filtered = series.between(start, end);
        assert_eq!(filtered.candles(), &[candle(3, 11.0), candle(4, 12.0)]);
    }

    #[test]
    fn test_sorted_orders_by_date() {
        let series = PriceSeries::sorted(vec![candle(5, 13.0), candle(2, 10.0)]);
        let days: Vec<u32> = series.dates().map(|d| chrono::Datelike::day(&d)).collect();
        assert_eq!(days, vec![2, 5]);
    }

    #[test]
    fn test_price_range_and_volume() {
        let series = PriceSeries::new(vec![candle(2, 10.0), candle(3, 20.0)]);
        assert_eq!(series.price_range(), Some((7.0, 22.0)));
        assert_eq!(series.max_volume(), 3000.0);
        assert_eq!(PriceSeries::default().price_range(), None);
    }

    #[test]
    fn test_missing_columns_in_canonical_order() {
        let table = RawPriceTable {
            columns: vec!["date".into(), "Close".into(), "Open".into()],
            rows: vec![],
        };
        assert_eq!(table.missing_columns(), vec!["High", "Low", "Volume"]);
    }
}
