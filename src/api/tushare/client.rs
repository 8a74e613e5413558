use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use super::models::{ApiError, DailyParams, TushareData, TushareRequest, TushareResponse};
use crate::api::PriceProvider;
use crate::config::ProviderConfig;
use crate::models::price::PriceSeries;

/// Tushare Pro API client for daily A-share bars
pub struct TushareClient {
    http_client: HttpClient,
    api_token: Option<String>,
    base_url: String,
}

impl TushareClient {
    pub const DEFAULT_BASE_URL: &'static str = "http://api.tushare.pro";
    const DAILY_FIELDS: &'static str = "ts_code,trade_date,open,high,low,close,vol";

    /// Create a new Tushare API client
    pub fn new(api_token: Option<String>) -> Self {
        Self::with_base_url(api_token, Self::DEFAULT_BASE_URL.to_string())
    }

    /// Create a new client with custom base URL (for testing)
    pub fn with_base_url(api_token: Option<String>, base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_token,
            base_url,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::with_base_url(config.token.clone(), config.base_url.clone())
    }

    fn create_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Read the body of a failed response and classify it
    async fn handle_error_response(response: reqwest::Response) -> ApiError {
        let status_code = response.status().as_u16();
        let body_text = response.text().await.unwrap_or_default();
        classify_error(status_code, body_text)
    }

    /// POST a query to the Tushare gateway
    ///
    /// # Arguments
    /// * `api_name` - Tushare interface name, e.g. `daily`
    /// * `params` - Interface parameters
    /// * `fields` - Comma separated list of columns to return
    ///
    /// # Returns
    /// * `Ok(TushareData)` - The result table
    /// * `Err(ApiError)` - HTTP, gateway, or decoding failure
    pub async fn query(
        &self,
        api_name: &str,
        params: serde_json::Value,
        fields: &str,
    ) -> Result<TushareData, ApiError> {
        let token = self
            .api_token
            .clone()
            .ok_or_else(|| ApiError::Unauthorized("TUSHARE_TOKEN is not set".to_string()))?;

        let body = TushareRequest {
            api_name: api_name.to_string(),
            token,
            params,
            fields: fields.to_string(),
        };

        let response = self
            .http_client
            .post(&self.base_url)
            .headers(Self::create_headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::RequestError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let err = Self::handle_error_response(response).await;
            warn!("Tushare {} query failed: {}", api_name, err);
            return Err(err);
        }

        let envelope = response
            .json::<TushareResponse>()
            .await
            .map_err(|e| ApiError::DeserializationError(format!("Failed to parse response: {}", e)))?;

        if envelope.code != 0 {
            return Err(ApiError::Provider {
                code: envelope.code,
                msg: envelope.msg.unwrap_or_default(),
            });
        }

        Ok(envelope.data.unwrap_or_default())
    }

    /// Daily OHLCV bars for `ts_code` between `start` and `end`, inclusive
    pub async fn daily(
        &self,
        ts_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ApiError> {
        let params = DailyParams {
            ts_code: ts_code.to_string(),
            start_date: start.format("%Y%m%d").to_string(),
            end_date: end.format("%Y%m%d").to_string(),
        };
        let params = serde_json::to_value(params)
            .map_err(|e| ApiError::RequestError(format!("Failed to encode params: {}", e)))?;

        let data = self.query("daily", params, Self::DAILY_FIELDS).await?;
        let series = data.into_price_series()?;
        debug!("Fetched {} daily bars for {}", series.len(), ts_code);
        Ok(series)
    }
}

impl PriceProvider for TushareClient {
    async fn load_data(
        &self,
        stock_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ApiError> {
        self.daily(stock_code, start, end).await
    }
}

/// Map an HTTP status code and body onto an [`ApiError`]
pub fn classify_error(status_code: u16, body_text: String) -> ApiError {
    match status_code {
        400 => {
            // Prefer the gateway's own message when the body is JSON
            if let Ok(err_json) = serde_json::from_str::<serde_json::Value>(&body_text) {
                let message = err_json
                    .get("msg")
                    .and_then(|v| v.as_str())
                    .unwrap_or(&body_text);
                ApiError::BadRequest(message.to_string())
            } else {
                ApiError::BadRequest(body_text)
            }
        }
        401 => ApiError::Unauthorized(body_text),
        403 => ApiError::Forbidden(body_text),
        404 => ApiError::NotFound(body_text),
        429 => ApiError::RateLimited(body_text),
        500..=599 => ApiError::ServerError(status_code as i32, body_text),
        _ => ApiError::HttpError(status_code as i32, body_text),
    }
}
