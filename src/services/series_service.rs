use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::api::PriceProvider;
use crate::models::price::{Candle, PriceSeries, RawPriceTable};
use crate::utils::dates::parse_date_like;
use crate::utils::errors::ChartError;

/// Header names accepted for the trading-date index column (case-insensitive)
const INDEX_COLUMNS: [&str; 4] = ["date", "trade_date", "datetime", "index"];

/// Read a price table from a CSV file
///
/// Expected layout: a header line naming the columns, then one line per
/// trading day, e.g. `date,Open,High,Low,Close,Volume`.
pub fn load_csv(path: impl AsRef<Path>) -> Result<RawPriceTable, ChartError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_csv(&content)
}

/// Split CSV text into a raw table
///
/// Cells are trimmed and quoted cells may contain commas. Blank lines are
/// skipped; short rows are kept and rejected later by [`table_to_series`].
pub fn parse_csv(content: &str) -> Result<RawPriceTable, ChartError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(|cell| Value::String(cell.to_string())).collect());
    }

    Ok(RawPriceTable { columns, rows })
}

/// Validate a raw table and convert it into a price series
///
/// Fails with a schema error naming every missing OHLCV column before any
/// row is looked at. Rows come back in ascending date order.
pub fn table_to_series(table: &RawPriceTable) -> Result<PriceSeries, ChartError> {
    let missing = table.missing_columns();
    if !missing.is_empty() {
        return Err(ChartError::Schema { missing });
    }

    let index_idx = table
        .columns
        .iter()
        .position(|c| INDEX_COLUMNS.iter().any(|name| c.eq_ignore_ascii_case(name)))
        .ok_or_else(|| {
            ChartError::Type(format!(
                "kdata must have a date index column (one of: {})",
                INDEX_COLUMNS.join(", ")
            ))
        })?;

    // Required columns are present, checked above
    let column = |name: &str| table.column_index(name).unwrap_or_default();
    let (open_idx, high_idx, low_idx, close_idx, volume_idx) = (
        column("Open"),
        column("High"),
        column("Low"),
        column("Close"),
        column("Volume"),
    );

    let mut candles = Vec::with_capacity(table.rows.len());
    for (row_no, row) in table.rows.iter().enumerate() {
        let number = |idx: usize| numeric_cell(row.get(idx), &table.columns[idx], row_no);

        let date = match row.get(index_idx) {
            Some(Value::String(text)) => parse_date_like(text)?,
            Some(Value::Number(n)) => parse_date_like(&n.to_string())?,
            other => {
                return Err(ChartError::Parse {
                    value: other.map(|v| v.to_string()).unwrap_or_default(),
                })
            }
        };

        candles.push(Candle {
            date,
            open: number(open_idx)?,
            high: number(high_idx)?,
            low: number(low_idx)?,
            close: number(close_idx)?,
            volume: number(volume_idx)?,
        });
    }

    Ok(PriceSeries::sorted(candles))
}

fn numeric_cell(cell: Option<&Value>, column: &str, row_no: usize) -> Result<f64, ChartError> {
    let parsed = match cell {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).ok_or_else(|| {
        ChartError::Type(format!(
            "kdata column '{}' row {} must be a finite number, got {}",
            column,
            row_no,
            cell.map(|v| v.to_string()).unwrap_or_else(|| "nothing".to_string())
        ))
    })
}

/// Resolve the price series a chart is drawn from
///
/// A supplied series is narrowed to `[start, end]` and put in ascending date
/// order; otherwise the provider is asked for exactly that range. Provider errors pass through unchanged.
pub async fn resolve_series<P: PriceProvider>(
    provider: &P,
    stock_code: &str,
    start: NaiveDate,
    end: NaiveDate,
    supplied: Option<PriceSeries>,
) -> Result<PriceSeries, ChartError> {
    let series = match supplied {
        Some(kdata) => kdata.between(start, end).into_sorted(),
        None => provider.load_data(stock_code, start, end).await?,
    };
    debug!("Resolved {} trading days for {}", series.len(), stock_code);
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::utils::errors::ErrorKind;
    use std::cell::Cell;
    use std::io::Write;

    const CSV: &str = "date,Open,High,Low,Close,Volume\n\
                       2024-01-02,10.0,10.5,9.8,10.2,1200\n\
                       \n\
                       2024-01-03, 10.2 ,10.9,10.1,10.8,1500\n";

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct CountingProvider {
        calls: Cell<usize>,
        result: Result<PriceSeries, ApiError>,
    }

    impl PriceProvider for CountingProvider {
        async fn load_data(&self, _: &str, _: NaiveDate, _: NaiveDate) -> Result<PriceSeries, ApiError> {
            self.calls.set(self.calls.get() + 1);
            self.result.clone()
        }
    }

    #[test]
    fn test_parse_csv_trims_and_skips_blank_lines() {
        let table = parse_csv(CSV).unwrap();
        assert_eq!(table.columns, vec!["date", "Open", "High", "Low", "Close", "Volume"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][1], Value::String("10.2".into()));
    }

    #[test]
    fn test_quoted_cells_keep_commas() {
        let table = parse_csv(
            "date,Open,High,Low,Close,Volume,note\n\
             2024-01-02,1,2,0.5,1.5,\"1,200\",\"gap up, then faded\"\n",
        )
        .unwrap();
        assert_eq!(table.columns.len(), 7);
        assert_eq!(table.rows[0].len(), 7);
        assert_eq!(table.rows[0][5], Value::String("1,200".into()));
        assert_eq!(table.rows[0][6], Value::String("gap up, then faded".into()));
    }

    #[test]
    fn test_short_row_is_type_error() {
        let table = parse_csv("date,Open,High,Low,Close,Volume\n2024-01-02,1,2\n").unwrap();
        assert_eq!(table_to_series(&table).unwrap_err().kind(), ErrorKind::Type);
    }

    #[test]
    fn test_table_to_series() {
        let series = table_to_series(&parse_csv(CSV).unwrap()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.candles()[1].date, ymd(2024, 1, 3));
        assert_eq!(series.candles()[1].close, 10.8);
        assert_eq!(series.candles()[0].volume, 1200.0);
    }

    #[test]
    fn test_newest_first_table_is_sorted() {
        let table = parse_csv(
            "trade_date,Open,High,Low,Close,Volume\n\
             20240105,3,3,3,3,1\n\
             20240104,2,2,2,2,1\n\
             20240103,1,1,1,1,1\n",
        )
        .unwrap();
        let series = table_to_series(&table).unwrap();
        let closes: Vec<f64> = series.closes().collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.candles()[0].date, ymd(2024, 1, 3));
    }

    #[test]
    fn test_missing_volume_is_schema_error() {
        let table = parse_csv("date,Open,High,Low,Close\n2024-01-02,1,2,0.5,1.5\n").unwrap();
        match table_to_series(&table) {
            Err(ChartError::Schema { missing }) => assert_eq!(missing, vec!["Volume"]),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_cell_is_type_error() {
        let table = parse_csv("date,Open,High,Low,Close,Volume\n2024-01-02,1,2,0.5,n/a,10\n").unwrap();
        let err = table_to_series(&table).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(err.to_string().contains("Close"));
    }

    #[test]
    fn test_non_finite_cells_are_type_errors() {
        for (cell, column) in [("inf", "High"), ("-inf", "Low"), ("NaN", "Close")] {
            let row = match column {
                "High" => format!("2024-01-02,1,{},0.5,1,10", cell),
                "Low" => format!("2024-01-02,1,2,{},1,10", cell),
                _ => format!("2024-01-02,1,2,0.5,{},10", cell),
            };
            let table = parse_csv(&format!("date,Open,High,Low,Close,Volume\n{}\n", row)).unwrap();
            let err = table_to_series(&table).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Type);
            assert!(err.to_string().contains(column), "{}", err);
            assert!(err.to_string().contains("row 0"), "{}", err);
        }
    }

    #[test]
    fn test_missing_index_column_is_type_error() {
        let table = parse_csv("Open,High,Low,Close,Volume\n1,2,0.5,1.5,10\n").unwrap();
        assert_eq!(table_to_series(&table).unwrap_err().kind(), ErrorKind::Type);
    }

    #[test]
    fn test_load_csv_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let table = load_csv(file.path()).unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_supplied_series_is_filtered_without_fetch() {
        let provider = CountingProvider {
            calls: Cell::new(0),
            result: Ok(PriceSeries::default()),
        };
        let kdata = table_to_series(&parse_csv(CSV).unwrap()).unwrap();

        let series = resolve_series(&provider, "X", ymd(2024, 1, 3), ymd(2024, 1, 31), Some(kdata.clone()))
            .await
            .unwrap();

        assert_eq!(provider.calls.get(), 0);
        assert_eq!(series.candles(), &kdata.candles()[1..]);
    }

    #[tokio::test]
    async fn test_provider_error_passes_through() {
        let provider = CountingProvider {
            calls: Cell::new(0),
            result: Err(ApiError::NotFound("unknown code".into())),
        };

        let err = resolve_series(&provider, "X", ymd(2024, 1, 1), ymd(2024, 1, 31), None)
            .await
            .unwrap_err();

        assert_eq!(provider.calls.get(), 1);
        assert!(matches!(err, ChartError::Provider(ApiError::NotFound(_))));
    }
}
