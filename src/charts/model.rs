//! Toolkit-independent chart descriptions
//!
//! A [`ChartModel`] is everything the frontend needs to draw one chart: the
//! traces, axis overrides and an optional annotation. Models are rebuilt from
//! scratch for every snapshot and never mutated by the UI.

use super::colorscale::Rgba;
use crate::telemetry::Revision;

/// The charts on the dashboard, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartId {
    Ping,
    PingDrop,
    Snr,
    Throughput,
    Downtime,
    Obstructions,
    Speedtests,
}

impl ChartId {
    pub const ALL: [ChartId; 7] = [
        ChartId::Ping,
        ChartId::PingDrop,
        ChartId::Snr,
        ChartId::Throughput,
        ChartId::Downtime,
        ChartId::Obstructions,
        ChartId::Speedtests,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ChartId::Ping => "Ping (ms)",
            ChartId::PingDrop => "Ping drop (%)",
            ChartId::Snr => "SNR",
            ChartId::Throughput => "Throughput (Mbps)",
            ChartId::Downtime => "Downtime",
            ChartId::Obstructions => "Obstructions",
            ChartId::Speedtests => "Speedtests (Mbps)",
        }
    }

    /// Stable identifier for widget ids
    pub fn key(&self) -> &'static str {
        match self {
            ChartId::Ping => "ping",
            ChartId::PingDrop => "pingdrop",
            ChartId::Snr => "snr",
            ChartId::Throughput => "throughput",
            ChartId::Downtime => "downtime",
            ChartId::Obstructions => "obstructions",
            ChartId::Speedtests => "speedtests",
        }
    }
}

impl std::fmt::Display for ChartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// How a chart is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Bars over a time axis; `x` is Unix seconds
    Bar,
    /// Filled polar outline; `x` is the bearing in degrees clockwise from
    /// north and `y` the radius
    Polar,
}

/// How a bar's value is shown on hover
#[derive(Debug, Clone, PartialEq)]
pub enum HoverFormat {
    /// The value with one decimal and a unit suffix
    Value { suffix: &'static str },
    /// The trace's per-point `labels`
    Labels,
    /// No hover text
    None,
}

/// One named series of a chart
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: String,
    pub x: Vec<f64>,
    /// `None` marks a bucket with no value
    pub y: Vec<Option<f64>>,
    /// Color used when `point_colors` is empty
    pub color: Rgba,
    /// Per-point colors from a colorscale
    pub point_colors: Vec<Rgba>,
    /// Per-point text (hover labels)
    pub labels: Vec<String>,
    pub hover: HoverFormat,
    /// Polar traces are drawn as filled areas
    pub fill: bool,
}

impl Trace {
    pub fn new(name: impl Into<String>, x: Vec<f64>, y: Vec<Option<f64>>, color: Rgba) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            color,
            point_colors: Vec::new(),
            labels: Vec::new(),
            hover: HoverFormat::Value { suffix: "" },
            fill: false,
        }
    }

    pub fn with_point_colors(mut self, colors: Vec<Rgba>) -> Self {
        self.point_colors = colors;
        self
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self.hover = HoverFormat::Labels;
        self
    }

    pub fn with_hover(mut self, hover: HoverFormat) -> Self {
        self.hover = hover;
        self
    }

    pub fn filled(mut self) -> Self {
        self.fill = true;
        self
    }

    pub fn len(&self) -> usize {
        self.x.len().min(self.y.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Color of point `i`
    pub fn point_color(&self, i: usize) -> Rgba {
        self.point_colors.get(i).copied().unwrap_or(self.color)
    }

    /// Hover text of point `i`
    pub fn hover_text(&self, i: usize) -> Option<String> {
        match &self.hover {
            HoverFormat::Value { suffix } => self
                .y
                .get(i)
                .copied()
                .flatten()
                .map(|v| format!("{:.1}{}", v, suffix)),
            HoverFormat::Labels => self.labels.get(i).cloned(),
            HoverFormat::None => None,
        }
    }

    /// Largest value of the trace, ignoring missing and non-finite values
    pub fn max_value(&self) -> Option<f64> {
        self.y
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .reduce(f64::max)
    }
}

/// Axis overrides; `None` leaves the choice to the renderer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisSpec {
    /// Displayed range; `(9.0, 0.0)` draws an inverted axis
    pub range: Option<(f64, f64)>,
    /// Explicit tick positions and labels; an empty list hides the ticks
    pub ticks: Option<Vec<(f64, String)>>,
}

impl AxisSpec {
    pub fn range(low: f64, high: f64) -> Self {
        Self {
            range: Some((low, high)),
            ticks: None,
        }
    }

    pub fn with_ticks<I, S>(mut self, ticks: I) -> Self
    where
        I: IntoIterator<Item = (f64, S)>,
        S: Into<String>,
    {
        self.ticks = Some(ticks.into_iter().map(|(v, s)| (v, s.into())).collect());
        self
    }

    pub fn without_ticks(mut self) -> Self {
        self.ticks = Some(Vec::new());
        self
    }

    /// Whether the range runs from high to low
    pub fn is_inverted(&self) -> bool {
        matches!(self.range, Some((a, b)) if a > b)
    }

    /// Range as `(min, max)` regardless of direction
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.range.map(|(a, b)| (a.min(b), a.max(b)))
    }
}

/// Free text placed on the chart, in fractions of the plot area
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// A complete chart description
#[derive(Debug, Clone, PartialEq)]
pub struct ChartModel {
    pub id: ChartId,
    pub title: String,
    pub kind: ChartKind,
    pub traces: Vec<Trace>,
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    pub show_legend: bool,
    pub annotation: Option<Annotation>,
}

impl ChartModel {
    pub fn new(id: ChartId, kind: ChartKind) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            kind,
            traces: Vec::new(),
            x_axis: AxisSpec::default(),
            y_axis: AxisSpec::default(),
            show_legend: false,
            annotation: None,
        }
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.traces.push(trace);
        self
    }

    pub fn with_legend(mut self) -> Self {
        self.show_legend = true;
        self
    }

    pub fn trace(&self, name: &str) -> Option<&Trace> {
        self.traces.iter().find(|t| t.name == name)
    }

    /// Whether there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.traces.iter().all(|t| t.is_empty())
    }

    /// Whether this is the "no data yet" placeholder
    pub fn is_placeholder(&self) -> bool {
        self.traces.is_empty() && self.annotation.is_some()
    }
}

/// All charts built from one snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub charts: Vec<ChartModel>,
    /// History block the time-series charts were built from
    pub revision: Option<Revision>,
}

impl Dashboard {
    pub fn get(&self, id: ChartId) -> Option<&ChartModel> {
        self.charts.iter().find(|c| c.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}
