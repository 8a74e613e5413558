use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::models::chart::{DEFAULT_MARKER_COLOR, DEFAULT_MARKER_SIZE};
use crate::models::price::{PriceSeries, RawPriceTable};
use crate::models::request::{
    coerce_dates, ChartRequest, DateInput, MarkerSeries, RawChartRequest, VerticalLines,
};
use crate::services::series_service::table_to_series;
use crate::utils::errors::ChartError;

/// Validate a raw request and convert it into a [`ChartRequest`]
///
/// Checks run in a fixed order and the first failure wins:
/// stock code, dates, date order, price data, vertical lines, markers.
pub fn normalize(raw: RawChartRequest) -> Result<ChartRequest, ChartError> {
    let stock_code = match &raw.stock_code {
        Value::String(code) => code.clone(),
        other => {
            return Err(ChartError::Type(format!(
                "stock_code must be a string, got {}",
                value_type(other)
            )))
        }
    };
    if stock_code.trim().is_empty() {
        return Err(ChartError::Type("stock_code must not be empty".to_string()));
    }

    let start_date = raw.start_date.to_date()?;
    let end_date = raw.end_date.to_date()?;
    if start_date > end_date {
        return Err(ChartError::Range {
            start: start_date,
            end: end_date,
        });
    }

    let kdata = raw.kdata.map(normalize_kdata).transpose()?;

    let vlines = match raw.vlines_dates {
        Some(dates) => Some(normalize_vlines(dates, raw.vlines_colors)?),
        None => None,
    };

    let markers = match raw.mark_list_dict {
        Some(marks) => normalize_markers(marks, raw.mark_list_sizes, raw.mark_list_colors)?,
        None => Vec::new(),
    };

    Ok(ChartRequest {
        stock_code,
        start_date,
        end_date,
        kdata,
        save_path: raw.save_path,
        vlines,
        markers,
    })
}

/// Re-check the invariants of an already typed request
pub fn validate(request: &ChartRequest) -> Result<(), ChartError> {
    if request.stock_code.trim().is_empty() {
        return Err(ChartError::Type("stock_code must not be empty".to_string()));
    }
    if request.start_date > request.end_date {
        return Err(ChartError::Range {
            start: request.start_date,
            end: request.end_date,
        });
    }
    if let Some(VerticalLines {
        dates,
        colors: Some(colors),
    }) = &request.vlines
    {
        check_vline_lengths(dates.len(), colors.len())?;
    }
    Ok(())
}

fn normalize_kdata(kdata: Value) -> Result<PriceSeries, ChartError> {
    let kind = value_type(&kdata);
    let table: RawPriceTable = serde_json::from_value(kdata).map_err(|e| {
        ChartError::Type(format!(
            "kdata must be a table with 'columns' and 'rows', got {} ({})",
            kind, e
        ))
    })?;
    table_to_series(&table)
}

fn normalize_vlines(dates: Value, colors: Option<Value>) -> Result<VerticalLines, ChartError> {
    let items = match dates {
        Value::Array(items) => items,
        other => {
            return Err(ChartError::Type(format!(
                "vlines_dates must be a list, got {}",
                value_type(&other)
            )))
        }
    };

    let inputs = items
        .into_iter()
        .map(|item| match item {
            Value::String(text) => Ok(DateInput::Text(text)),
            Value::Number(n) => Ok(DateInput::Text(n.to_string())),
            other => Err(ChartError::Parse {
                value: other.to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let dates = coerce_dates(&inputs)?;

    let colors = colors
        .map(|colors| string_list(colors, "vlines_colors"))
        .transpose()?;
    if let Some(colors) = &colors {
        check_vline_lengths(dates.len(), colors.len())?;
    }

    Ok(VerticalLines { dates, colors })
}

fn check_vline_lengths(dates: usize, colors: usize) -> Result<(), ChartError> {
    if dates != colors {
        return Err(ChartError::LengthMismatch {
            subject: "vlines_colors must match vlines_dates".to_string(),
            expected: dates,
            actual: colors,
        });
    }
    Ok(())
}

fn normalize_markers(
    marks: Value,
    sizes: Option<Value>,
    colors: Option<Value>,
) -> Result<Vec<MarkerSeries>, ChartError> {
    let marks = object(marks, "mark_list_dict")?;

    let mut flags_by_label = BTreeMap::new();
    for (label, flags) in marks {
        let flags = match flags {
            Value::Array(items) => items,
            other => {
                return Err(ChartError::Type(format!(
                    "mark_list_dict[{}] must be a list, got {}",
                    label,
                    value_type(&other)
                )))
            }
        };
        let flags = flags
            .iter()
            .map(Value::as_bool)
            .collect::<Option<Vec<bool>>>()
            .ok_or_else(|| {
                ChartError::Type(format!(
                    "mark_list_dict[{}] must contain only booleans",
                    label
                ))
            })?;
        flags_by_label.insert(label, flags);
    }

    // Sizes are checked completely before colors are looked at
    let sizes = sizes
        .map(|sizes| override_map(sizes, "mark_list_sizes", &flags_by_label, |v| {
            v.as_f64().filter(|n| n.is_finite() && *n > 0.0)
        }))
        .transpose()?;
    let colors = colors
        .map(|colors| override_map(colors, "mark_list_colors", &flags_by_label, |v| {
            v.as_str().map(str::to_string)
        }))
        .transpose()?;

    Ok(flags_by_label
        .into_iter()
        .map(|(label, flags)| {
            let size = match &sizes {
                None => Some(DEFAULT_MARKER_SIZE),
                Some(map) => map.get(&label).copied(),
            };
            let color = match &colors {
                None => Some(DEFAULT_MARKER_COLOR.to_string()),
                Some(map) => map.get(&label).cloned(),
            };
            MarkerSeries {
                label,
                flags,
                size,
                color,
            }
        })
        .collect())
}

/// Validate a per-label override mapping against the known marker labels
fn override_map<T>(
    value: Value,
    name: &str,
    labels: &BTreeMap<String, Vec<bool>>,
    convert: impl Fn(&Value) -> Option<T>,
) -> Result<BTreeMap<String, T>, ChartError> {
    let map = object(value, name)?;

    let unknown: Vec<String> = map.keys().filter(|k| !labels.contains_key(*k)).cloned().collect();
    if !unknown.is_empty() {
        return Err(ChartError::KeyMismatch {
            mapping: name.to_string(),
            keys: unknown,
        });
    }

    map.into_iter()
        .map(|(label, v)| match convert(&v) {
            Some(converted) => Ok((label, converted)),
            None => Err(ChartError::Type(format!(
                "{}[{}] has an invalid value: {}",
                name, label, v
            ))),
        })
        .collect()
}

fn object(value: Value, name: &str) -> Result<Map<String, Value>, ChartError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ChartError::Type(format!(
            "{} must be a mapping, got {}",
            name,
            value_type(&other)
        ))),
    }
}

fn string_list(value: Value, name: &str) -> Result<Vec<String>, ChartError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ChartError::Type(format!(
                "{} must be a list, got {}",
                name,
                value_type(&other)
            )))
        }
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(ChartError::Type(format!(
                "{} must contain only strings, got {}",
                name,
                value_type(&other)
            ))),
        })
        .collect()
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
