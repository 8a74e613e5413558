//! Rasterising a [`Figure`] with plotters
//!
//! The x axis is categorical: trading day `i` sits at `x = i`, so weekends and
//! holidays leave no gaps.

use std::ops::Range;
use std::path::Path;

use chrono::NaiveDate;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::figure::{Axes, AxesRole, Figure, GridStyle};
use super::style::{parse_color, to_rgb_color, Rgb};
use crate::models::chart::{LineStyle, MarkerShape};
use crate::utils::errors::ChartError;

type PanelChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Share of the drawable height given to the price panel when volume is shown
const PRICE_PANEL_SHARE: f64 = 0.7;
/// Half the width of a candle body, in trading days
const CANDLE_HALF_WIDTH: f64 = 0.3;
/// Target number of major ticks along y
const Y_MAJOR_TICKS: usize = 6;
/// Minor y ticks between two major ones
const Y_MINOR_DIVISIONS: f64 = 5.0;
/// Minor tick mark length as a share of the panel span
const MINOR_TICK_LENGTH: f64 = 0.012;
/// Tick counts above this are treated as a degenerate axis
const MAX_TICKS: i64 = 10_000;

/// Draw `figure` into a PNG file of `figure.size * dpi` pixels
pub fn draw_png(figure: &Figure, path: &Path, dpi: u32, tight: bool) -> Result<(), ChartError> {
    let root = BitMapBackend::new(path, figure.pixel_size(dpi)).into_drawing_area();
    draw_figure(&root, figure, dpi, tight).map_err(|e| ChartError::Backend(e.to_string()))?;
    root.present()
        .map_err(|e| ChartError::Backend(format!("Failed to write {}: {}", path.display(), e)))?;
    Ok(())
}

/// Draw every panel of `figure` onto `root`
pub fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    dpi: u32,
    tight: bool,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    // Points to pixels
    let scale = dpi as f64 / 72.0;
    root.fill(&to_rgb_color(figure.style.background))?;

    let (_, height) = root.dim_in_pixel();
    let margin = if tight {
        (4.0 * scale).round() as u32
    } else {
        height / 12
    };
    let area = root.margin(margin, margin, margin, margin);

    let n = figure.series.len();
    let x_range = -0.5..(n as f64 - 0.5);
    let dates: Vec<NaiveDate> = figure.series.dates().collect();

    let price_axes = figure.axes.iter().find(|a| a.role == AxesRole::Price);
    let volume_axes = figure.axes.iter().find(|a| a.role == AxesRole::Volume);

    if let Some(volume_axes) = volume_axes {
        let (_, area_height) = area.dim_in_pixel();
        let (upper, lower) = area.split_vertically((area_height as f64 * PRICE_PANEL_SHARE) as u32);
        draw_price_panel(&upper, figure, price_axes, &x_range, &dates, false, scale)?;
        draw_volume_panel(&lower, figure, volume_axes, &x_range, &dates, scale)?;
    } else {
        draw_price_panel(&area, figure, price_axes, &x_range, &dates, true, scale)?;
    }

    Ok(())
}

fn draw_price_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    figure: &Figure,
    axes: Option<&Axes>,
    x_range: &Range<f64>,
    dates: &[NaiveDate],
    show_dates: bool,
    scale: f64,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let (low, high) = figure.series.price_range().unwrap_or((0.0, 1.0));
    let pad = ((high - low) * 0.05).max(high.abs() * 0.01).max(1e-6);
    let y_range = (low - pad)..(high + pad);

    let mut chart = ChartBuilder::on(area)
        .x_label_area_size(if show_dates { (30.0 * scale) as u32 } else { 0 })
        .y_label_area_size((50.0 * scale) as u32)
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;

    configure_mesh(&mut chart, figure, dates, show_dates, scale, |v| format!("{:.2}", v))?;

    if let Some(axes) = axes {
        draw_grid(&mut chart, axes, x_range, &y_range, figure.style.axis_label, scale)?;
    }

    let up = to_rgb_color(figure.style.up);
    let down = to_rgb_color(figure.style.down);
    let wick_width = (0.8 * scale).round().max(1.0) as u32;

    for (i, candle) in figure.series.candles().iter().enumerate() {
        let x = i as f64;
        let color = if candle.is_up() { up } else { down };

        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x, candle.low), (x, candle.high)],
            color.stroke_width(wick_width),
        )))?;

        let body_top = candle.open.max(candle.close);
        let body_bottom = candle.open.min(candle.close);
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - CANDLE_HALF_WIDTH, body_bottom), (x + CANDLE_HALF_WIDTH, body_top)],
            color.filled(),
        )))?;
    }

    let line_width = (1.0 * scale).round().max(1.0) as u32;
    for vline in &figure.vlines {
        let style = to_rgb_color(vline.color).stroke_width(line_width);
        let segments = dash_segments(
            (vline.position, y_range.start),
            (vline.position, y_range.end),
            vline.line_style.pattern(),
        );
        chart.draw_series(segments.into_iter().map(|[a, b]| PathElement::new(vec![a, b], style)))?;
    }

    for layer in &figure.markers {
        let radius = marker_radius(layer.size, scale);
        match layer.shape {
            MarkerShape::TriangleUp => {
                chart.draw_series(PointSeries::of_element(
                    layer.points.clone(),
                    radius,
                    to_rgb_color(layer.color).filled(),
                    &|coord, size, style| {
                        EmptyElement::at(coord) + TriangleMarker::new((0, 0), size, style)
                    },
                ))?;
            }
        }
    }

    Ok(())
}

fn draw_volume_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    figure: &Figure,
    axes: &Axes,
    x_range: &Range<f64>,
    dates: &[NaiveDate],
    scale: f64,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let max_volume = figure.series.max_volume();
    let y_range = 0.0..if max_volume > 0.0 { max_volume * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(area)
        .x_label_area_size((30.0 * scale) as u32)
        .y_label_area_size((50.0 * scale) as u32)
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;

    configure_mesh(&mut chart, figure, dates, true, scale, format_volume)?;
    draw_grid(&mut chart, axes, x_range, &y_range, figure.style.axis_label, scale)?;

    let alpha = figure.style.volume_alpha;
    for (i, candle) in figure.series.candles().iter().enumerate() {
        let x = i as f64;
        let color = if candle.is_up() { figure.style.up } else { figure.style.down };
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - CANDLE_HALF_WIDTH, 0.0), (x + CANDLE_HALF_WIDTH, candle.volume)],
            to_rgb_color(color).mix(alpha).filled(),
        )))?;
    }

    Ok(())
}

/// Axis lines and labels; grid lines are drawn separately by [`draw_grid`]
fn configure_mesh<DB: DrawingBackend>(
    chart: &mut PanelChart<'_, DB>,
    figure: &Figure,
    dates: &[NaiveDate],
    show_dates: bool,
    scale: f64,
    y_format: impl Fn(f64) -> String,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let font_size = 9.0 * scale;
    let label_color = to_rgb_color(figure.style.axis_label);
    let x_label = |x: &f64| date_label(dates, *x);
    let y_label = |y: &f64| y_format(*y);

    let x_labels = if show_dates { dates.len() / 5 + 1 } else { 0 };

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(x_labels)
        .y_labels(Y_MAJOR_TICKS + 2)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .label_style(("sans-serif", font_size).into_font().color(&label_color))
        .axis_style(label_color.stroke_width((0.8 * scale).round().max(1.0) as u32))
        .draw()
}

/// Major and minor grid lines, plus minor tick marks, as configured on `axes`
fn draw_grid<DB: DrawingBackend>(
    chart: &mut PanelChart<'_, DB>,
    axes: &Axes,
    x_range: &Range<f64>,
    y_range: &Range<f64>,
    tick_color: Rgb,
    scale: f64,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let y_major_step = nice_step(y_range.end - y_range.start, Y_MAJOR_TICKS);
    let last_day = x_range.end.floor().max(0.0) as usize;

    if axes.minor_ticks {
        let xs: Vec<f64> = axes
            .x_minor_every
            .filter(|every| *every > 0)
            .map(|every| (0..=last_day).step_by(every).map(|i| i as f64).collect())
            .unwrap_or_default();
        let ys = ticks(y_range, y_major_step / Y_MINOR_DIVISIONS);

        if let Some(style) = &axes.minor_grid {
            draw_grid_lines(chart, style, &xs, &ys, x_range, y_range, scale)?;
        }

        let width = (0.6 * scale).round().max(1.0) as u32;
        let shape = to_rgb_color(tick_color).stroke_width(width);
        chart.draw_series(
            minor_tick_marks(&xs, &ys, x_range, y_range)
                .into_iter()
                .map(|[a, b]| PathElement::new(vec![a, b], shape)),
        )?;
    }

    if let Some(style) = &axes.major_grid {
        let xs: Vec<f64> = axes
            .x_major_every
            .filter(|every| *every > 0)
            .map(|every| (0..=last_day).step_by(every).map(|i| i as f64).collect())
            .unwrap_or_default();
        let ys = ticks(y_range, y_major_step);
        draw_grid_lines(chart, style, &xs, &ys, x_range, y_range, scale)?;
    }

    Ok(())
}

fn draw_grid_lines<DB: DrawingBackend>(
    chart: &mut PanelChart<'_, DB>,
    style: &GridStyle,
    xs: &[f64],
    ys: &[f64],
    x_range: &Range<f64>,
    y_range: &Range<f64>,
    scale: f64,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let Some(rgb) = parse_color(&style.color) else {
        return Ok(());
    };
    let width = (style.width * scale).round().max(1.0) as u32;
    let shape = to_rgb_color(rgb).mix(style.alpha).stroke_width(width);
    let pattern = style.line_style.pattern();

    let vertical = xs
        .iter()
        .flat_map(|&x| dash_segments((x, y_range.start), (x, y_range.end), pattern));
    let horizontal = ys
        .iter()
        .flat_map(|&y| dash_segments((x_range.start, y), (x_range.end, y), pattern));

    chart.draw_series(
        vertical
            .chain(horizontal)
            .map(|[a, b]| PathElement::new(vec![a, b], shape)),
    )?;
    Ok(())
}

/// Split a straight line into the visible runs of a dash pattern
///
/// `pattern` alternates on/off lengths as fractions of the full line; an
/// empty pattern yields the whole line.
pub fn dash_segments(from: (f64, f64), to: (f64, f64), pattern: &[f64]) -> Vec<[(f64, f64); 2]> {
    if pattern.is_empty() || pattern.iter().any(|run| *run <= 0.0) {
        return vec![[from, to]];
    }

    let lerp = |t: f64| (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t);
    let mut segments = Vec::new();
    let mut t = 0.0;
    let mut i = 0;
    while t < 1.0 {
        let end = (t + pattern[i % pattern.len()]).min(1.0);
        if i % 2 == 0 {
            segments.push([lerp(t), lerp(end)]);
        }
        t = end;
        i += 1;
    }
    segments
}

/// A round step (1, 2, 2.5 or 5 times a power of ten) giving about `target`
/// intervals over `span`
pub fn nice_step(span: f64, target: usize) -> f64 {
    if span <= 0.0 || !span.is_finite() || target == 0 {
        return 1.0;
    }
    let raw = span / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 2.5 {
        2.5
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Short marks along the bottom and left edges, pointing into the panel
fn minor_tick_marks(
    xs: &[f64],
    ys: &[f64],
    x_range: &Range<f64>,
    y_range: &Range<f64>,
) -> Vec<[(f64, f64); 2]> {
    let x_len = (x_range.end - x_range.start) * MINOR_TICK_LENGTH;
    let y_len = (y_range.end - y_range.start) * MINOR_TICK_LENGTH;

    let bottom = xs
        .iter()
        .map(|&x| [(x, y_range.start), (x, y_range.start + y_len)]);
    let left = ys
        .iter()
        .map(|&y| [(x_range.start, y), (x_range.start + x_len, y)]);
    bottom.chain(left).collect()
}

/// Multiples of `step` that fall inside `range`
fn ticks(range: &Range<f64>, step: f64) -> Vec<f64> {
    if step <= 0.0 || !step.is_finite() || !range.start.is_finite() || !range.end.is_finite() {
        return Vec::new();
    }
    let first = (range.start / step).ceil() as i64;
    let last = (range.end / step).floor() as i64;
    if last.saturating_sub(first) > MAX_TICKS {
        return Vec::new();
    }
    (first..=last).map(|k| k as f64 * step).collect()
}

/// Marker half-size in pixels for an area given in points squared
fn marker_radius(size: f64, scale: f64) -> i32 {
    (size.max(0.0).sqrt() / 2.0 * scale).round().max(1.0) as i32
}

fn date_label(dates: &[NaiveDate], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    dates
        .get(idx as usize)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn format_volume(volume: f64) -> String {
    if volume >= 1e9 {
        format!("{:.1}B", volume / 1e9)
    } else if volume >= 1e6 {
        format!("{:.1}M", volume / 1e6)
    } else if volume >= 1e3 {
        format!("{:.1}K", volume / 1e3)
    } else {
        format!("{:.0}", volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_line_is_one_segment() {
        assert_eq!(dash_segments((0.0, 0.0), (0.0, 10.0), &[]), vec![[(0.0, 0.0), (0.0, 10.0)]]);
    }

    #[test]
    fn test_dash_segments_alternate() {
        let segments = dash_segments((0.0, 0.0), (10.0, 0.0), &[0.25, 0.25]);
        assert_eq!(segments, vec![[(0.0, 0.0), (2.5, 0.0)], [(5.0, 0.0), (7.5, 0.0)]]);
    }

    #[test]
    fn test_dash_dot_pattern_stays_within_line() {
        let segments = dash_segments((3.0, 0.0), (3.0, 1.0), LineStyle::DashDot.pattern());
        assert!(!segments.is_empty());
        assert!(segments.iter().all(|[a, b]| a.0 == 3.0 && b.1 <= 1.0 && a.1 < b.1));
    }

    #[test]
    fn test_nice_step() {
        assert_eq!(nice_step(10.0, 5), 2.0);
        assert_eq!(nice_step(60.0, 6), 10.0);
        assert!((nice_step(0.9, 6) - 0.2).abs() < 1e-12);
        assert_eq!(nice_step(0.0, 6), 1.0);
    }

    #[test]
    fn test_ticks_inside_range() {
        assert_eq!(ticks(&(9.5..14.2), 2.0), vec![10.0, 12.0, 14.0]);
        assert!(ticks(&(0.0..1.0), 0.0).is_empty());
        assert!(ticks(&(0.5..f64::INFINITY), 0.2).is_empty());
        assert!(ticks(&(0.0..1e12), 1e-3).is_empty());
    }

    #[test]
    fn test_minor_tick_marks_hug_the_edges() {
        let marks = minor_tick_marks(&[0.0, 1.0], &[10.0], &(-0.5..1.5), &(9.0..11.0));
        assert_eq!(marks.len(), 3);
        assert_eq!(marks[0][0], (0.0, 9.0));
        assert!((marks[0][1].1 - 9.024).abs() < 1e-9);
        assert_eq!(marks[2][0], (-0.5, 10.0));
        assert!((marks[2][1].0 - (-0.476)).abs() < 1e-9);
    }

    #[test]
    fn test_date_labels_only_on_whole_days() {
        let dates = vec![
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        ];
        assert_eq!(date_label(&dates, 1.0), "2024-01-03");
        assert_eq!(date_label(&dates, 0.5), "");
        assert_eq!(date_label(&dates, 5.0), "");
        assert_eq!(date_label(&dates, -1.0), "");
    }

    #[test]
    fn test_marker_radius_scales_with_area() {
        // 100 pt^2 is a 10 pt wide marker
        assert_eq!(marker_radius(100.0, 1.0), 5);
        assert_eq!(marker_radius(100.0, 300.0 / 72.0), 21);
        assert_eq!(marker_radius(0.0, 1.0), 1);
    }

    #[test]
    fn test_format_volume() {
        assert_eq!(format_volume(950.0), "950");
        assert_eq!(format_volume(1_500_000.0), "1.5M");
    }
}
