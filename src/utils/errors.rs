use chrono::NaiveDate;
use thiserror::Error;

use crate::api::tushare::ApiError;

/// Coarse classification of a [`ChartError`], used by callers that only care
/// about which validation stage rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Type,
    Parse,
    Range,
    Schema,
    LengthMismatch,
    KeyMismatch,
    Provider,
    Backend,
    Io,
}

/// Errors raised while validating a chart request or rendering it
#[derive(Debug, Error)]
pub enum ChartError {
    /// Wrong input shape or type
    #[error("{0}")]
    Type(String),
    /// Date-like value that could not be parsed
    #[error("Could not parse '{value}' as a date")]
    Parse { value: String },
    #[error("start_date {start} must not be after end_date {end}")]
    Range { start: NaiveDate, end: NaiveDate },
    /// Price data lacking required columns, in canonical column order
    #[error("Price data is missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },
    #[error("{subject}: expected {expected} entries, got {actual}")]
    LengthMismatch {
        subject: String,
        expected: usize,
        actual: usize,
    },
    /// Override mapping keys that do not name a marker series
    #[error("Keys of {mapping} not found in mark_list_dict: {}", keys.join(", "))]
    KeyMismatch { mapping: String, keys: Vec<String> },
    #[error(transparent)]
    Provider(#[from] ApiError),
    #[error("Chart backend error: {0}")]
    Backend(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ChartError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChartError::Type(_) => ErrorKind::Type,
            ChartError::Parse { .. } => ErrorKind::Parse,
            ChartError::Range { .. } => ErrorKind::Range,
            ChartError::Schema { .. } => ErrorKind::Schema,
            ChartError::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            ChartError::KeyMismatch { .. } => ErrorKind::KeyMismatch,
            ChartError::Provider(_) => ErrorKind::Provider,
            ChartError::Backend(_) => ErrorKind::Backend,
            // Malformed CSV is the wrong input shape
            ChartError::Csv(_) => ErrorKind::Type,
            ChartError::Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_message_lists_columns() {
        let err = ChartError::Schema {
            missing: vec!["High".to_string(), "Volume".to_string()],
        };
        assert_eq!(err.to_string(), "Price data is missing required columns: High, Volume");
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_provider_error_is_transparent() {
        let err = ChartError::from(ApiError::NotFound("no such code".to_string()));
        assert_eq!(err.to_string(), "Not Found: no such code");
        assert_eq!(err.kind(), ErrorKind::Provider);
    }
}
