//! Chart rendering with egui_plot
//!
//! Turns a [`ChartModel`] into an egui_plot [`Plot`]. The model decides what
//! is drawn; this module only handles geometry and axes:
//!
//! - **Bar charts**: bars over a time axis, traces side by side within a slot
//! - **Inverted axes**: a `(9, 0)` range draws bars hanging from the top
//! - **Tick overrides**: explicit tick labels, or none at all
//! - **Polar charts**: wedge sectors around the origin, north up, clockwise
//! - **Annotations**: free text such as the "Waiting..." placeholder

use std::ops::RangeInclusive;

use chrono::{DateTime, Local};
use egui::{Align2, Color32, RichText, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, Corner, GridInput, GridMark, Legend, Line, Plot, PlotBounds, PlotPoint,
    PlotPoints, PlotUi, Polygon, Text,
};

use crate::charts::{AxisSpec, ChartKind, ChartModel, Rgba, Trace};

/// Fraction of a slot filled by bars
const BAR_FILL: f64 = 0.8;

/// Slot width used when a chart has a single bar, in seconds
const SINGLE_BAR_SLOT: f64 = 60.0;

/// Arc segments per polar wedge
const ARC_STEPS: usize = 8;

/// Radial grid rings drawn on polar charts
const POLAR_RINGS: usize = 3;

pub fn color32(rgba: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(rgba[0], rgba[1], rgba[2], rgba[3])
}

/// Local wall-clock label for a Unix timestamp
pub fn format_time_label(secs: f64) -> String {
    if !secs.is_finite() {
        return String::new();
    }
    DateTime::from_timestamp(secs.floor() as i64, 0)
        .map(|t| t.with_timezone(&Local).format("%-I:%M%p").to_string())
        .unwrap_or_default()
}

/// Where a trace's bars go inside each slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    /// Width of one bar
    pub width: f64,
    /// Offset of trace `k`'s bar centers from the slot center is
    /// `first_offset + k * width`
    pub first_offset: f64,
}

impl BarLayout {
    /// Layout for `traces` bar traces sharing x positions `x`
    pub fn new(x: &[f64], traces: usize) -> Self {
        let slot = min_spacing(x).unwrap_or(SINGLE_BAR_SLOT);
        let traces = traces.max(1) as f64;
        let width = slot * BAR_FILL / traces;
        Self {
            width,
            first_offset: -slot * BAR_FILL / 2.0 + width / 2.0,
        }
    }

    pub fn offset(&self, trace: usize) -> f64 {
        self.first_offset + trace as f64 * self.width
    }
}

/// Smallest positive gap between consecutive x values
fn min_spacing(x: &[f64]) -> Option<f64> {
    x.windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .filter(|d| d.is_finite() && *d > 0.0)
        .reduce(f64::min)
}

/// Maps model values onto plot coordinates for a possibly inverted axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMap {
    /// `Some(a + b)` when the axis runs from `a` down to `b`
    flip: Option<f64>,
}

impl AxisMap {
    pub fn new(axis: &AxisSpec) -> Self {
        match axis.range {
            Some((a, b)) if a > b => Self { flip: Some(a + b) },
            _ => Self { flip: None },
        }
    }

    pub fn apply(&self, v: f64) -> f64 {
        match self.flip {
            Some(sum) => sum - v,
            None => v,
        }
    }

    /// Bar `(base, value)` for a model bar of height `h` starting at zero
    pub fn bar(&self, h: f64) -> (f64, f64) {
        let base = self.apply(0.0);
        (base, self.apply(h) - base)
    }
}

/// Grid marks for an explicit tick list
pub fn tick_marks(ticks: &[(f64, String)], map: AxisMap) -> Vec<GridMark> {
    let values: Vec<f64> = ticks.iter().map(|(v, _)| map.apply(*v)).collect();
    let step_size = {
        let mut sorted = values.clone();
        sorted.sort_by(f64::total_cmp);
        min_spacing(&sorted).unwrap_or(1.0)
    };
    values
        .into_iter()
        .map(|value| GridMark { value, step_size })
        .collect()
}

/// Label of the tick at `value`, if any
pub fn tick_label(ticks: &[(f64, String)], map: AxisMap, value: f64) -> String {
    ticks
        .iter()
        .find(|(v, _)| (map.apply(*v) - value).abs() < 1e-6)
        .map(|(_, label)| label.clone())
        .unwrap_or_default()
}

/// Grid marks for a time axis with minute-aligned steps
pub fn time_grid_marks(bounds: (f64, f64)) -> Vec<GridMark> {
    const STEPS: [f64; 9] = [
        60.0, 120.0, 300.0, 600.0, 900.0, 1_800.0, 3_600.0, 7_200.0, 21_600.0,
    ];
    let (min, max) = bounds;
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return Vec::new();
    }

    let step = STEPS
        .iter()
        .copied()
        .find(|s| range / s <= 8.0)
        .unwrap_or(43_200.0);

    let mut marks = Vec::new();
    let mut current = (min / step).ceil() * step;
    while current <= max {
        marks.push(GridMark {
            value: current,
            step_size: step,
        });
        current += step;
    }
    marks
}

/// Point on a polar chart: bearing in degrees clockwise from north
pub fn polar_to_xy(bearing_deg: f64, r: f64) -> [f64; 2] {
    let theta = bearing_deg.to_radians();
    [r * theta.sin(), r * theta.cos()]
}

/// Closed sector from the origin covering `from..to` degrees at radius `r`
pub fn sector_points(from_deg: f64, to_deg: f64, r: f64) -> Vec<[f64; 2]> {
    let mut points = Vec::with_capacity(ARC_STEPS + 2);
    points.push([0.0, 0.0]);
    for step in 0..=ARC_STEPS {
        let t = step as f64 / ARC_STEPS as f64;
        points.push(polar_to_xy(from_deg + (to_deg - from_deg) * t, r));
    }
    points
}

/// Sectors of a polar trace; outline points come in (start, end) pairs
pub fn trace_sectors(trace: &Trace) -> Vec<Vec<[f64; 2]>> {
    trace
        .x
        .chunks_exact(2)
        .zip(trace.y.chunks_exact(2))
        .filter_map(|(theta, r)| {
            let r = r[0]?;
            (r > 0.0).then(|| sector_points(theta[0], theta[1], r))
        })
        .collect()
}

/// Value range covered by a bar chart's traces
fn bar_value_bounds(chart: &ChartModel) -> (f64, f64) {
    if let Some(bounds) = chart.y_axis.bounds() {
        return bounds;
    }
    let max = chart
        .traces
        .iter()
        .filter_map(|t| t.max_value())
        .fold(0.0, f64::max);
    (0.0, if max > 0.0 { max * 1.05 } else { 1.0 })
}

/// Time range covered by a bar chart, padded by half a slot
fn bar_time_bounds(chart: &ChartModel) -> (f64, f64) {
    if let Some(bounds) = chart.x_axis.bounds() {
        return bounds;
    }
    let xs = || chart.traces.iter().flat_map(|t| t.x.iter().copied());
    let min = xs().fold(f64::INFINITY, f64::min);
    let max = xs().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let first = chart.traces.first().map(|t| t.x.as_slice()).unwrap_or(&[]);
    let half = min_spacing(first).unwrap_or(SINGLE_BAR_SLOT) / 2.0;
    (min - half, max + half)
}

/// Render one chart with a title above it
pub fn render_chart(ui: &mut Ui, chart: &ChartModel, height: f32) {
    ui.label(RichText::new(&chart.title).strong());
    match chart.kind {
        ChartKind::Bar => render_bar_chart(ui, chart, height),
        ChartKind::Polar => render_polar_chart(ui, chart, height),
    }
}

fn base_plot(chart: &ChartModel, height: f32) -> Plot<'static> {
    let mut plot = Plot::new(chart.id.key())
        .height(height)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false)
        .show_x(false)
        .show_y(false);

    if chart.show_legend {
        plot = plot.legend(
            Legend::default()
                .position(Corner::RightTop)
                .background_alpha(0.8),
        );
    }
    plot
}

fn render_bar_chart(ui: &mut Ui, chart: &ChartModel, height: f32) {
    let y_map = AxisMap::new(&chart.y_axis);
    let (x_min, x_max) = bar_time_bounds(chart);
    let (y_min, y_max) = bar_value_bounds(chart);

    let mut plot = base_plot(chart, height);

    plot = match chart.x_axis.ticks.clone() {
        Some(ticks) => {
            let labels = ticks.clone();
            plot.x_grid_spacer(move |_input: GridInput| tick_marks(&ticks, AxisMap { flip: None }))
                .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
                    tick_label(&labels, AxisMap { flip: None }, mark.value)
                })
        }
        None => plot
            .x_grid_spacer(|input: GridInput| time_grid_marks(input.bounds))
            .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
                format_time_label(mark.value)
            }),
    };

    if let Some(ticks) = chart.y_axis.ticks.clone() {
        let labels = ticks.clone();
        plot = plot
            .y_grid_spacer(move |_input: GridInput| tick_marks(&ticks, y_map))
            .y_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
                tick_label(&labels, y_map, mark.value)
            });
    }

    plot.show(ui, |plot_ui| {
        plot_ui.set_plot_bounds(PlotBounds::from_min_max([x_min, y_min], [x_max, y_max]));

        let shared_x = chart.traces.first().map(|t| t.x.as_slice()).unwrap_or(&[]);
        let layout = BarLayout::new(shared_x, chart.traces.len());
        for (k, trace) in chart.traces.iter().enumerate() {
            plot_ui.bar_chart(bar_chart(trace, layout.width, layout.offset(k), y_map));
        }

        if let Some(annotation) = &chart.annotation {
            annotate(
                plot_ui,
                &annotation.text,
                (annotation.x, annotation.y),
                (x_min, x_max),
                (y_min, y_max),
            );
        }
    });
}

fn bar_chart(trace: &Trace, width: f64, offset: f64, y_map: AxisMap) -> BarChart {
    let bars: Vec<Bar> = (0..trace.len())
        .filter_map(|i| {
            let h = trace.y[i].filter(|v| v.is_finite())?;
            let (base, value) = y_map.bar(h);
            Some(
                Bar::new(trace.x[i] + offset, value)
                    .base_offset(base)
                    .width(width)
                    .fill(color32(trace.point_color(i)))
                    .stroke(Stroke::NONE)
                    .name(trace.hover_text(i).unwrap_or_default()),
            )
        })
        .collect();

    BarChart::new(trace.name.clone(), bars)
        .color(color32(trace.color))
        .element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| bar.name.clone()))
}

fn render_polar_chart(ui: &mut Ui, chart: &ChartModel, height: f32) {
    let radius = chart.y_axis.bounds().map(|(_, max)| max).unwrap_or(1.0).max(f64::EPSILON);
    let extent = radius * 1.25;

    let plot = base_plot(chart, height)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false);

    plot.show(ui, |plot_ui| {
        plot_ui.set_plot_bounds(PlotBounds::from_min_max([-extent, -extent], [extent, extent]));
        draw_polar_grid(plot_ui, chart, radius);

        for trace in &chart.traces {
            let fill = color32(trace.color);
            let stroke = Stroke::new(1.0, fill.to_opaque());
            for sector in trace_sectors(trace) {
                plot_ui.polygon(
                    Polygon::new(trace.name.clone(), PlotPoints::from(sector))
                        .fill_color(if trace.fill { fill } else { Color32::TRANSPARENT })
                        .stroke(stroke),
                );
            }
        }
    });
}

fn draw_polar_grid(plot_ui: &mut PlotUi, chart: &ChartModel, radius: f64) {
    let grid = Color32::from_gray(128).gamma_multiply(0.5);
    for ring in 1..=POLAR_RINGS {
        let r = radius * ring as f64 / POLAR_RINGS as f64;
        let circle: Vec<[f64; 2]> = (0..=72).map(|i| polar_to_xy(i as f64 * 5.0, r)).collect();
        plot_ui.line(Line::new("", PlotPoints::from(circle)).color(grid).width(1.0));
    }

    for (bearing, label) in chart.x_axis.ticks.iter().flatten() {
        let spoke = vec![[0.0, 0.0], polar_to_xy(*bearing, radius)];
        plot_ui.line(Line::new("", PlotPoints::from(spoke)).color(grid).width(1.0));

        let [x, y] = polar_to_xy(*bearing, radius * 1.12);
        plot_ui.text(
            Text::new("", PlotPoint::new(x, y), label.as_str()).anchor(Align2::CENTER_CENTER),
        );
    }
}

/// Place text at fractions of the visible area
fn annotate(plot_ui: &mut PlotUi, text: &str, at: (f64, f64), x: (f64, f64), y: (f64, f64)) {
    let (fx, fy) = at;
    let px = x.0 + (x.1 - x.0) * fx;
    let py = y.0 + (y.1 - y.0) * fy;
    plot_ui.text(
        Text::new("annotation", PlotPoint::new(px, py), RichText::new(text).size(16.0))
            .anchor(Align2::LEFT_CENTER),
    );
}
