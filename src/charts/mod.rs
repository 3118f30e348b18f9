//! Chart models built from telemetry
//!
//! This module turns a [`TelemetrySnapshot`](crate::telemetry::TelemetrySnapshot)
//! into plain chart descriptions. Nothing here touches the UI toolkit, so the
//! mapping can be tested and benchmarked on its own.
//!
//! # Main Types
//!
//! - [`ChartBuilder`] - Maps a snapshot to a [`Dashboard`], keeping rolling y-axis maxima
//! - [`ChartModel`] / [`Trace`] - One chart and its series
//! - [`Colorscale`] - Continuous colors for latency, drop rate and SNR

pub mod builder;
pub mod colorscale;
pub mod model;

pub use builder::{
    obstruction_chart, planned_outage, snr_bar_height, speedtest_chart, wedge_outline,
    ChartAggregation, ChartBuilder, ChartSettings, WAITING_TEXT,
};
pub use colorscale::{palette, ColorRange, Colorscale, Rgba, PORTLAND};
pub use model::{Annotation, AxisSpec, ChartId, ChartKind, ChartModel, Dashboard, HoverFormat, Trace};
