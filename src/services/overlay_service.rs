use crate::models::chart::{
    LineStyle, MarkerShape, OverlayLayer, VerticalLineSpec, DEFAULT_VLINE_COLOR,
    FALLBACK_MARKER_COLOR, FALLBACK_MARKER_SIZE,
};
use crate::models::price::PriceSeries;
use crate::models::request::{MarkerSeries, VerticalLines};
use crate::utils::errors::ChartError;

/// Build the dash-dot vertical line spec, painting lines red when no colors
/// were given. Returns `None` when there is nothing to draw.
pub fn vertical_line_spec(vlines: Option<VerticalLines>) -> Option<VerticalLineSpec> {
    let VerticalLines { dates, colors } = vlines?;
    if dates.is_empty() {
        return None;
    }
    let colors = colors.unwrap_or_else(|| vec![DEFAULT_VLINE_COLOR.to_string(); dates.len()]);
    Some(VerticalLineSpec {
        dates,
        colors,
        line_style: LineStyle::DashDot,
    })
}

/// Pair each flag with the close of the same trading day
///
/// Flagged days carry the close, all others are `None`. Both sequences must
/// be the same length.
pub fn marker_values(flags: &[bool], series: &PriceSeries) -> Vec<Option<f64>> {
    flags
        .iter()
        .zip(series.closes())
        .map(|(&flag, close)| flag.then_some(close))
        .collect()
}

/// Turn every marker series into a triangle-up scatter layer on the price panel
pub fn marker_layers(
    markers: &[MarkerSeries],
    series: &PriceSeries,
) -> Result<Vec<OverlayLayer>, ChartError> {
    markers
        .iter()
        .map(|marker| {
            if marker.flags.len() != series.len() {
                return Err(ChartError::LengthMismatch {
                    subject: format!("mark_list_dict[{}] must have one flag per trading day", marker.label),
                    expected: series.len(),
                    actual: marker.flags.len(),
                });
            }
            Ok(OverlayLayer {
                label: marker.label.clone(),
                values: marker_values(&marker.flags, series),
                marker: MarkerShape::TriangleUp,
                size: marker.size.unwrap_or(FALLBACK_MARKER_SIZE),
                color: marker
                    .color
                    .clone()
                    .unwrap_or_else(|| FALLBACK_MARKER_COLOR.to_string()),
                panel: 0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::price::Candle;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| Candle {
                    date: ymd(2024, 1, 2 + i as u32),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 100.0,
                })
                .collect(),
        )
    }

    #[test]
    fn test_vlines_default_to_red_dash_dot() {
        let spec = vertical_line_spec(Some(VerticalLines {
            dates: vec![ymd(2024, 1, 3), ymd(2024, 1, 5)],
            colors: None,
        }))
        .unwrap();
        assert_eq!(spec.colors, vec!["red", "red"]);
        assert_eq!(spec.line_style, LineStyle::DashDot);
    }

    #[test]
    fn test_vlines_keep_explicit_colors() {
        let spec = vertical_line_spec(Some(VerticalLines {
            dates: vec![ymd(2024, 1, 3)],
            colors: Some(vec!["green".to_string()]),
        }))
        .unwrap();
        assert_eq!(spec.colors, vec!["green"]);
    }

    #[test]
    fn test_empty_vlines_are_dropped() {
        assert!(vertical_line_spec(None).is_none());
        assert!(vertical_line_spec(Some(VerticalLines { dates: vec![], colors: None })).is_none());
    }

    #[test]
    fn test_marker_values_follow_closes() {
        let s = series(&[10.0, 11.0, 12.0, 13.0]);
        let values = marker_values(&[true, false, false, true], &s);
        assert_eq!(values, vec![Some(10.0), None, None, Some(13.0)]);
    }

    #[test]
    fn test_length_mismatch_names_label() {
        let s = series(&[10.0, 11.0, 12.0]);
        let markers = vec![
            MarkerSeries::new("buy", vec![true, false, true]),
            MarkerSeries::new("sell", vec![true]),
        ];
        match marker_layers(&markers, &s) {
            Err(ChartError::LengthMismatch { subject, expected, actual }) => {
                assert!(subject.contains("sell"));
                assert_eq!((expected, actual), (3, 1));
            }
            other => panic!("expected length mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_layer_defaults_and_fallbacks() {
        let s = series(&[10.0, 11.0]);
        let markers = vec![
            MarkerSeries::new("defaults", vec![true, false]),
            MarkerSeries::new("fallbacks", vec![false, true])
                .with_size(None)
                .with_color(None),
        ];
        let layers = marker_layers(&markers, &s).unwrap();

        assert_eq!((layers[0].size, layers[0].color.as_str()), (10.0, "blue"));
        assert_eq!((layers[1].size, layers[1].color.as_str()), (100.0, "purple"));
        assert!(layers.iter().all(|l| l.panel == 0 && l.marker == MarkerShape::TriangleUp));
        assert_eq!(layers[1].values, vec![None, Some(11.0)]);
    }
}
