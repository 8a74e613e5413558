//! Chart request models
//!
//! [`RawChartRequest`] mirrors what a caller hands over (a CLI invocation or a
//! JSON request file) and may hold values of the wrong shape. It is turned into
//! a [`ChartRequest`] by `request_service::normalize`, which is the only place
//! those shapes are checked.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::chart::{DEFAULT_MARKER_COLOR, DEFAULT_MARKER_SIZE};
use crate::models::price::PriceSeries;
use crate::utils::dates::parse_date_like;
use crate::utils::errors::ChartError;

/// A date that is either already a calendar date or still date-like text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Date(NaiveDate),
    Text(String),
}

impl DateInput {
    pub fn to_date(&self) -> Result<NaiveDate, ChartError> {
        match self {
            DateInput::Date(date) => Ok(*date),
            DateInput::Text(text) => parse_date_like(text),
        }
    }
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        DateInput::Date(date)
    }
}

impl From<&str> for DateInput {
    fn from(text: &str) -> Self {
        DateInput::Text(text.to_string())
    }
}

impl From<String> for DateInput {
    fn from(text: String) -> Self {
        DateInput::Text(text)
    }
}

/// Coerce a batch of date inputs
///
/// When every element is already a date they pass through untouched;
/// otherwise every element goes through the same parse stage.
pub fn coerce_dates(inputs: &[DateInput]) -> Result<Vec<NaiveDate>, ChartError> {
    if let Some(dates) = inputs
        .iter()
        .map(|input| match input {
            DateInput::Date(date) => Some(*date),
            DateInput::Text(_) => None,
        })
        .collect::<Option<Vec<_>>>()
    {
        return Ok(dates);
    }

    inputs.iter().map(DateInput::to_date).collect()
}

/// Vertical lines drawn across the price panel
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalLines {
    pub dates: Vec<NaiveDate>,
    /// One color per date; `None` paints every line in the default color
    pub colors: Option<Vec<String>>,
}

/// One scatter overlay: a boolean flag per trading day plus styling overrides
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSeries {
    pub label: String,
    pub flags: Vec<bool>,
    pub size: Option<f64>,
    pub color: Option<String>,
}

impl MarkerSeries {
    /// New series carrying the default size and color
    pub fn new(label: impl Into<String>, flags: Vec<bool>) -> Self {
        Self {
            label: label.into(),
            flags,
            size: Some(DEFAULT_MARKER_SIZE),
            color: Some(DEFAULT_MARKER_COLOR.to_string()),
        }
    }

    /// Override the marker size; `None` leaves it to the overlay fallback
    pub fn with_size(mut self, size: Option<f64>) -> Self {
        self.size = size;
        self
    }

    /// Override the marker color; `None` leaves it to the overlay fallback
    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = color;
        self
    }
}

/// A validated chart request
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub stock_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Price data to chart instead of fetching it
    pub kdata: Option<PriceSeries>,
    pub save_path: Option<PathBuf>,
    pub vlines: Option<VerticalLines>,
    pub markers: Vec<MarkerSeries>,
}

impl ChartRequest {
    pub fn new(stock_code: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            stock_code: stock_code.into(),
            start_date,
            end_date,
            kdata: None,
            save_path: None,
            vlines: None,
            markers: Vec::new(),
        }
    }

    pub fn with_kdata(mut self, kdata: PriceSeries) -> Self {
        self.kdata = Some(kdata);
        self
    }

    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    pub fn with_vlines(mut self, dates: Vec<NaiveDate>, colors: Option<Vec<String>>) -> Self {
        self.vlines = Some(VerticalLines { dates, colors });
        self
    }

    pub fn with_marker(mut self, marker: MarkerSeries) -> Self {
        self.markers.push(marker);
        self
    }
}

/// A chart request exactly as the caller supplied it
///
/// Field names follow the JSON request file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChartRequest {
    #[serde(default)]
    pub stock_code: Value,
    pub start_date: DateInput,
    pub end_date: DateInput,
    /// `{"columns": [...], "rows": [[...], ...]}`
    #[serde(default)]
    pub kdata: Option<Value>,
    #[serde(default)]
    pub save_path: Option<PathBuf>,
    #[serde(default)]
    pub vlines_dates: Option<Value>,
    #[serde(default)]
    pub vlines_colors: Option<Value>,
    /// `{label: [bool, ...]}`
    #[serde(default)]
    pub mark_list_dict: Option<Value>,
    /// `{label: size}`
    #[serde(default)]
    pub mark_list_sizes: Option<Value>,
    /// `{label: color}`
    #[serde(default)]
    pub mark_list_colors: Option<Value>,
}

impl RawChartRequest {
    pub fn new(stock_code: &str, start_date: impl Into<DateInput>, end_date: impl Into<DateInput>) -> Self {
        Self {
            stock_code: Value::String(stock_code.to_string()),
            start_date: start_date.into(),
            end_date: end_date.into(),
            kdata: None,
            save_path: None,
            vlines_dates: None,
            vlines_colors: None,
            mark_list_dict: None,
            mark_list_sizes: None,
            mark_list_colors: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_coerce_dates_mixed_inputs() {
        let inputs = vec![DateInput::Date(ymd(2024, 1, 2)), DateInput::from("20240105")];
        assert_eq!(coerce_dates(&inputs).unwrap(), vec![ymd(2024, 1, 2), ymd(2024, 1, 5)]);
    }

    #[test]
    fn test_coerce_dates_reports_bad_element() {
        let inputs = vec![DateInput::from("2024-01-02"), DateInput::from("not a date")];
        match coerce_dates(&inputs) {
            Err(ChartError::Parse { value }) => assert_eq!(value, "not a date"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_marker_defaults() {
        let marker = MarkerSeries::new("buy", vec![true, false]);
        assert_eq!(marker.size, Some(10.0));
        assert_eq!(marker.color.as_deref(), Some("blue"));

        let bare = marker.with_size(None).with_color(None);
        assert_eq!(bare.size, None);
        assert_eq!(bare.color, None);
    }

    #[test]
    fn test_raw_request_from_json() {
        let json = r#"{
            "stock_code": "000001.SZ",
            "start_date": "2024-01-02",
            "end_date": "20240131",
            "vlines_dates": ["2024-01-10"],
            "mark_list_dict": {"buy": [true, false]}
        }"#;
        let raw: RawChartRequest = serde_json::from_str(json).unwrap();

        assert_eq!(raw.stock_code, Value::String("000001.SZ".into()));
        assert_eq!(raw.start_date, DateInput::Date(ymd(2024, 1, 2)));
        assert_eq!(raw.end_date, DateInput::Text("20240131".into()));
        assert!(raw.kdata.is_none());
        assert!(raw.mark_list_sizes.is_none());
    }
}
