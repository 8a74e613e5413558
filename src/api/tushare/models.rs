use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::price::{Candle, PriceSeries};

/// Request body shared by every Tushare Pro endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TushareRequest {
    pub api_name: String,
    pub token: String,
    pub params: Value,
    pub fields: String,
}

/// Parameters of the `daily` endpoint; dates are `YYYYMMDD`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyParams {
    pub ts_code: String,
    pub start_date: String,
    pub end_date: String,
}

/// Envelope returned by Tushare Pro
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TushareResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<TushareData>,
}

/// Column-oriented result table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TushareData {
    pub fields: Vec<String>,
    pub items: Vec<Vec<Value>>,
}

impl TushareData {
    fn field_index(&self, name: &str) -> Result<usize, ApiError> {
        self.fields
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| ApiError::DeserializationError(format!("Response has no '{}' field", name)))
    }

    /// Convert `daily` rows into a price series sorted by trade date
    ///
    /// Tushare returns the newest day first; `vol` becomes the volume column.
    pub fn into_price_series(self) -> Result<PriceSeries, ApiError> {
        let date_idx = self.field_index("trade_date")?;
        let open_idx = self.field_index("open")?;
        let high_idx = self.field_index("high")?;
        let low_idx = self.field_index("low")?;
        let close_idx = self.field_index("close")?;
        let vol_idx = self.field_index("vol")?;

        let mut candles = Vec::with_capacity(self.items.len());
        for (row_no, row) in self.items.iter().enumerate() {
            let cell = |idx: usize| -> Result<&Value, ApiError> {
                row.get(idx).ok_or_else(|| {
                    ApiError::DeserializationError(format!("Row {} is too short", row_no))
                })
            };
            let number = |idx: usize| -> Result<f64, ApiError> {
                cell(idx)?.as_f64().filter(|n| n.is_finite()).ok_or_else(|| {
                    ApiError::DeserializationError(format!(
                        "Row {} field '{}' is not a finite number",
                        row_no, self.fields[idx]
                    ))
                })
            };

            let date_str = cell(date_idx)?.as_str().unwrap_or_default();
            let date = NaiveDate::parse_from_str(date_str, "%Y%m%d").map_err(|e| {
                ApiError::DeserializationError(format!(
                    "Row {} has invalid trade_date '{}': {}",
                    row_no, date_str, e
                ))
            })?;

            candles.push(Candle {
                date,
                open: number(open_idx)?,
                high: number(high_idx)?,
                low: number(low_idx)?,
                close: number(close_idx)?,
                volume: number(vol_idx)?,
            });
        }

        Ok(PriceSeries::sorted(candles))
    }
}

/// Error type for Tushare API operations
#[derive(Debug, Clone)]
pub enum ApiError {
    /// 400 Bad Request
    BadRequest(String),
    /// 401 Unauthorized, or no token configured
    Unauthorized(String),
    /// 403 Forbidden
    Forbidden(String),
    /// 404 Not Found
    NotFound(String),
    /// 429 Too Many Requests
    RateLimited(String),
    /// 5xx Server Error
    ServerError(i32, String),
    /// Other HTTP errors
    HttpError(i32, String),
    /// Non-zero `code` in an otherwise successful response
    Provider { code: i64, msg: String },
    /// Network/request error
    RequestError(String),
    /// Deserialization error
    DeserializationError(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::RateLimited(msg) => write!(f, "Rate Limited: {}", msg),
            ApiError::ServerError(code, msg) => write!(f, "Server Error ({}): {}", code, msg),
            ApiError::HttpError(code, msg) => write!(f, "HTTP Error ({}): {}", code, msg),
            ApiError::Provider { code, msg } => write!(f, "Tushare error {}: {}", code, msg),
            ApiError::RequestError(msg) => write!(f, "Request Error: {}", msg),
            ApiError::DeserializationError(msg) => write!(f, "Deserialization Error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}
