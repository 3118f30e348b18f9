//! Snapshot to chart mapping
//!
//! [`ChartBuilder`] is the only place that knows how telemetry columns turn
//! into bars. Each time-series chart truncates its column to the history
//! window, downsamples it with the chart's aggregation method and then maps
//! the buckets into one or more traces.
//!
//! The builder keeps a little state between snapshots: the y-axis ceiling of
//! the ping and throughput charts follows a [`RollingMax`] so the axis does
//! not jump around on every refresh.

use serde::{Deserialize, Serialize};

use super::colorscale::{palette, with_alpha, ColorRange, PORTLAND};
use super::model::{
    Annotation, AxisSpec, ChartId, ChartKind, ChartModel, Dashboard, HoverFormat, Trace,
};
use crate::downsample::{downsample_series, most_recent, AggregationMethod};
use crate::history::{RollingMax, DEFAULT_ROLLING_CAPACITY};
use crate::telemetry::{DishStatus, Metric, Revision, SeriesBlock, SpeedtestHistory, TelemetrySnapshot};

/// Placeholder text while no speed test has completed
pub const WAITING_TEXT: &str = "Waiting...";

/// SNR ceiling reported by the terminal
pub const SNR_MAX: f64 = 9.0;

/// Smallest radial range of the obstruction chart
pub const MIN_OBSTRUCTION_RANGE: f64 = 0.03;

const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Aggregation method of each time-series chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartAggregation {
    #[serde(default = "default_max")]
    pub ping: AggregationMethod,
    #[serde(default = "default_mean")]
    pub ping_drop: AggregationMethod,
    #[serde(default = "default_min")]
    pub snr: AggregationMethod,
    #[serde(default = "default_max")]
    pub throughput: AggregationMethod,
    #[serde(default = "default_max")]
    pub downtime: AggregationMethod,
}

fn default_max() -> AggregationMethod {
    AggregationMethod::Max
}

fn default_mean() -> AggregationMethod {
    AggregationMethod::Mean
}

fn default_min() -> AggregationMethod {
    AggregationMethod::Min
}

impl Default for ChartAggregation {
    fn default() -> Self {
        Self {
            ping: AggregationMethod::Max,
            ping_drop: AggregationMethod::Mean,
            snr: AggregationMethod::Min,
            throughput: AggregationMethod::Max,
            downtime: AggregationMethod::Max,
        }
    }
}

/// Settings the builder needs from the app configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    /// History window in samples (one sample per second)
    pub history_records: usize,
    /// Target bar count after downsampling
    pub max_data_points: usize,
    pub aggregation: ChartAggregation,
    /// Entries kept by the y-axis rolling maximum
    pub rolling_capacity: usize,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            history_records: 600,
            max_data_points: 200,
            aggregation: ChartAggregation::default(),
            rolling_capacity: DEFAULT_ROLLING_CAPACITY,
        }
    }
}

/// Builds a [`Dashboard`] from telemetry snapshots
#[derive(Debug, Clone)]
pub struct ChartBuilder {
    settings: ChartSettings,
    ping_max: RollingMax,
    throughput_max: RollingMax,
}

impl Default for ChartBuilder {
    fn default() -> Self {
        Self::new(ChartSettings::default())
    }
}

impl ChartBuilder {
    pub fn new(settings: ChartSettings) -> Self {
        let capacity = settings.rolling_capacity;
        Self {
            settings,
            ping_max: RollingMax::new(capacity),
            throughput_max: RollingMax::new(capacity),
        }
    }

    /// Change the history window; old maxima no longer describe the new window
    pub fn set_history_records(&mut self, records: usize) {
        if records != self.settings.history_records {
            self.settings.history_records = records;
            self.ping_max.clear();
            self.throughput_max.clear();
        }
    }

    /// Build every chart from one snapshot
    pub fn build(&mut self, snapshot: &TelemetrySnapshot, preferred: Revision) -> Dashboard {
        let series = snapshot.series(preferred);
        let block = series.map(|(_, block)| block);

        let charts = vec![
            block.map_or_else(|| empty_chart(ChartId::Ping), |b| self.ping_chart(b)),
            block.map_or_else(|| empty_chart(ChartId::PingDrop), |b| self.ping_drop_chart(b)),
            block.map_or_else(|| empty_chart(ChartId::Snr), |b| self.snr_chart(b)),
            block.map_or_else(|| empty_chart(ChartId::Throughput), |b| self.throughput_chart(b)),
            block.map_or_else(|| empty_chart(ChartId::Downtime), |b| self.downtime_chart(b)),
            snapshot
                .status
                .as_ref()
                .map_or_else(|| empty_chart(ChartId::Obstructions), obstruction_chart),
            speedtest_chart(snapshot.speedtests()),
        ];

        Dashboard {
            charts,
            revision: series.map(|(rev, _)| rev),
        }
    }

    /// Truncate a column to the history window and downsample it
    fn prepare(
        &self,
        block: &SeriesBlock,
        values: &[f64],
        method: AggregationMethod,
    ) -> (Vec<f64>, Vec<Option<f64>>) {
        let records = self.settings.history_records;
        let timestamps = most_recent(&block.timestamp, records);
        let values = most_recent(values, records);
        downsample_series(timestamps, values, method, self.settings.max_data_points)
            .into_iter()
            .map(|(t, v)| (t, v.filter(|v| v.is_finite())))
            .unzip()
    }

    /// Latency bars colored from 30 ms (blue) to 120 ms (red)
    pub fn ping_chart(&mut self, block: &SeriesBlock) -> ChartModel {
        let (x, y) = self.prepare(
            block,
            block.metric(Metric::PingLatencyMs),
            self.settings.aggregation.ping,
        );
        let colors = PORTLAND.map_all(&y, ColorRange::new(30.0, 120.0));
        let trace = Trace::new("ping", x, y, palette(0))
            .with_point_colors(colors)
            .with_hover(HoverFormat::Value { suffix: "ms" });

        let ceiling = self.ping_max.push_and_max(trace.max_value().unwrap_or(0.0));
        let mut chart = ChartModel::new(ChartId::Ping, ChartKind::Bar).with_trace(trace);
        if ceiling > 0.0 {
            chart.y_axis = AxisSpec::range(0.0, ceiling);
        }
        chart
    }

    /// Drop rate in percent, red from 1% upward
    pub fn ping_drop_chart(&mut self, block: &SeriesBlock) -> ChartModel {
        let percent: Vec<f64> = block
            .metric(Metric::PingDropRate)
            .iter()
            .map(|v| v * 100.0)
            .collect();
        let (x, y) = self.prepare(block, &percent, self.settings.aggregation.ping_drop);
        let colors = PORTLAND.map_all(&y, ColorRange::new(1.0, 0.0));
        let trace = Trace::new("ping drop rate", x, y, palette(0))
            .with_point_colors(colors)
            .with_hover(HoverFormat::Value { suffix: "%" });

        ChartModel::new(ChartId::PingDrop, ChartKind::Bar).with_trace(trace)
    }

    /// SNR drawn as bars hanging from the top of an inverted axis
    ///
    /// A bar's height is `9 - snr`, so a perfect signal is a short bar; a
    /// height of exactly zero is drawn as 0.5 to stay visible.
    pub fn snr_chart(&mut self, block: &SeriesBlock) -> ChartModel {
        let (x, snr) = self.prepare(block, block.metric(Metric::Snr), self.settings.aggregation.snr);

        let heights = snr.iter().map(|v| v.map(snr_bar_height)).collect();
        let labels = snr
            .iter()
            .map(|v| v.map(|v| format!("{:.1}", v)).unwrap_or_default())
            .collect();
        let negated: Vec<Option<f64>> = snr.iter().map(|v| v.map(|v| -v)).collect();
        let colors = PORTLAND.map_all(&negated, ColorRange::new(-SNR_MAX, 0.0));

        let trace = Trace::new("SNR", x, heights, palette(0))
            .with_point_colors(colors)
            .with_labels(labels);

        let mut chart = ChartModel::new(ChartId::Snr, ChartKind::Bar).with_trace(trace);
        chart.y_axis = AxisSpec::range(SNR_MAX, 0.0)
            .with_ticks([(0.0, "9"), (3.0, "6"), (6.0, "3"), (9.0, "0")]);
        chart
    }

    /// Download and upload in Mbps
    pub fn throughput_chart(&mut self, block: &SeriesBlock) -> ChartModel {
        let method = self.settings.aggregation.throughput;
        let to_mbps = |bps: &[f64]| -> Vec<f64> { bps.iter().map(|v| v / 1e6).collect() };

        let down = to_mbps(block.metric(Metric::DownlinkThroughputBps));
        let up = to_mbps(block.metric(Metric::UplinkThroughputBps));
        let (x_down, y_down) = self.prepare(block, &down, method);
        let (x_up, y_up) = self.prepare(block, &up, method);

        let download = Trace::new("download", x_down, y_down, palette(0))
            .with_hover(HoverFormat::Value { suffix: " Mbps" });
        let upload = Trace::new("upload", x_up, y_up, palette(1))
            .with_hover(HoverFormat::Value { suffix: " Mbps" });

        let peak = download
            .max_value()
            .into_iter()
            .chain(upload.max_value())
            .fold(0.0, f64::max);
        let ceiling = self.throughput_max.push_and_max(peak);

        let mut chart = ChartModel::new(ChartId::Throughput, ChartKind::Bar)
            .with_trace(download)
            .with_trace(upload)
            .with_legend();
        if ceiling > 0.0 {
            chart.y_axis = AxisSpec::range(0.0, ceiling);
        }
        chart
    }

    /// Planned outages and obstructions as full-height markers
    pub fn downtime_chart(&mut self, block: &SeriesBlock) -> ChartModel {
        let method = self.settings.aggregation.downtime;
        let planned: Vec<f64> = block.scheduled.iter().map(|s| planned_outage(*s)).collect();
        let obstructed: Vec<f64> = block
            .obstructed
            .iter()
            .map(|o| if o.unwrap_or(false) { 1.0 } else { 0.0 })
            .collect();

        let (x_planned, y_planned) = self.prepare(block, &planned, method);
        let (x_obst, y_obst) = self.prepare(block, &obstructed, method);

        let mut chart = ChartModel::new(ChartId::Downtime, ChartKind::Bar)
            .with_trace(
                Trace::new("planned", x_planned, y_planned, palette(0)).with_hover(HoverFormat::None),
            )
            .with_trace(
                Trace::new("obstructed", x_obst, y_obst, palette(1)).with_hover(HoverFormat::None),
            )
            .with_legend();
        chart.y_axis = AxisSpec::range(0.0, 1.0).without_ticks();
        chart
    }
}

/// Bar height for an SNR reading
pub fn snr_bar_height(snr: f64) -> f64 {
    let height = SNR_MAX - snr;
    if height == 0.0 {
        0.5
    } else {
        height
    }
}

/// 1.0 when the terminal was not scheduled for service
///
/// An unknown schedule counts as scheduled, so it is not an outage.
pub fn planned_outage(scheduled: Option<bool>) -> f64 {
    if scheduled.unwrap_or(true) {
        0.0
    } else {
        1.0
    }
}

/// Chart with no data yet
fn empty_chart(id: ChartId) -> ChartModel {
    let chart = ChartModel::new(id, ChartKind::Bar);
    match id {
        ChartId::Throughput | ChartId::Downtime => chart.with_legend(),
        ChartId::Obstructions => ChartModel::new(id, ChartKind::Polar).with_legend(),
        _ => chart,
    }
}

/// Outline points for a set of wedges, two per wedge
///
/// Wedge `i` spans `i*w - w/2` to `i*w + w/2` degrees with `w = 360 / count`.
pub fn wedge_outline(wedges: &[f64]) -> (Vec<f64>, Vec<Option<f64>>) {
    if wedges.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let width = 360.0 / wedges.len() as f64;
    wedges
        .iter()
        .enumerate()
        .flat_map(|(i, &r)| {
            let center = i as f64 * width;
            let r = if r.is_finite() { Some(r) } else { None };
            [(center - width / 2.0, r), (center + width / 2.0, r)]
        })
        .unzip()
}

/// Polar chart of the latest and worst-seen obstruction per wedge
pub fn obstruction_chart(status: &DishStatus) -> ChartModel {
    let mut chart = ChartModel::new(ChartId::Obstructions, ChartKind::Polar).with_legend();
    let Some(latest) = status.latest_obstruction() else {
        return chart;
    };

    let max_seen = status.max_wedges();
    let radial_max = max_seen.iter().copied().fold(MIN_OBSTRUCTION_RANGE, f64::max);

    let (theta, r) = wedge_outline(&max_seen);
    chart.traces.push(
        Trace::new("max", theta, r, with_alpha(palette(0), 0x88))
            .with_hover(HoverFormat::None)
            .filled(),
    );
    let (theta, r) = wedge_outline(&latest.wedge_fraction_obstructed);
    chart.traces.push(
        Trace::new("latest", theta, r, with_alpha(palette(1), 0x88))
            .with_hover(HoverFormat::None)
            .filled(),
    );

    chart.y_axis = AxisSpec::range(0.0, radial_max);
    chart.x_axis = AxisSpec::range(0.0, 360.0)
        .with_ticks(COMPASS.iter().enumerate().map(|(i, label)| (i as f64 * 45.0, *label)));
    chart
}

/// Speed-test bars, or the waiting placeholder before the first result
pub fn speedtest_chart(history: Option<&SpeedtestHistory>) -> ChartModel {
    let mut chart = ChartModel::new(ChartId::Speedtests, ChartKind::Bar).with_legend();
    let Some(history) = history.filter(|h| !h.is_empty()) else {
        chart.x_axis = AxisSpec::range(0.0, 1.0).without_ticks();
        chart.y_axis = AxisSpec::range(0.0, 1.0).without_ticks();
        chart.annotation = Some(Annotation {
            x: 0.1,
            y: 0.5,
            text: WAITING_TEXT.to_string(),
        });
        return chart;
    };

    let x: Vec<f64> = history.results.iter().map(|r| r.timestamp).collect();
    let download = history.results.iter().map(|r| Some(r.download_mbps())).collect();
    let upload = history.results.iter().map(|r| Some(r.upload_mbps())).collect();
    let hover = history
        .results
        .iter()
        .map(|r| r.summary_lines().join("\n"))
        .collect();

    chart.traces.push(Trace::new("download", x.clone(), download, palette(0)).with_labels(hover));
    chart
        .traces
        .push(Trace::new("upload", x, upload, palette(1)).with_hover(HoverFormat::None));
    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{ObstructionStats, SpeedtestResult};

    fn block(len: usize) -> SeriesBlock {
        SeriesBlock {
            timestamp: (0..len).map(|i| i as f64).collect(),
            pop_ping_latency_ms: (0..len).map(|i| 30.0 + i as f64).collect(),
            pop_ping_drop_rate: vec![0.5; len],
            snr: vec![9.0; len],
            downlink_throughput_bps: vec![120e6; len],
            uplink_throughput_bps: vec![8e6; len],
            scheduled: vec![Some(true); len],
            obstructed: vec![Some(false); len],
        }
    }

    #[test]
    fn test_snr_inversion() {
        assert_eq!(snr_bar_height(9.0), 0.5);
        assert_eq!(snr_bar_height(6.5), 2.5);
        assert_eq!(snr_bar_height(0.0), 9.0);

        let mut builder = ChartBuilder::default();
        let mut b = block(3);
        b.snr = vec![9.0, 7.5, 3.0];
        let chart = builder.snr_chart(&b);
        let trace = &chart.traces[0];
        assert_eq!(trace.y, vec![Some(0.5), Some(1.5), Some(6.0)]);
        assert_eq!(trace.labels, vec!["9.0", "7.5", "3.0"]);
        assert!(chart.y_axis.is_inverted());
        assert_eq!(chart.y_axis.ticks.as_ref().map(|t| t.len()), Some(4));
    }

    #[test]
    fn test_planned_outage_treats_unknown_as_scheduled() {
        assert_eq!(planned_outage(None), 0.0);
        assert_eq!(planned_outage(Some(true)), 0.0);
        assert_eq!(planned_outage(Some(false)), 1.0);
    }

    #[test]
    fn test_ping_drop_percent() {
        let mut builder = ChartBuilder::default();
        let chart = builder.ping_drop_chart(&block(4));
        assert_eq!(chart.traces[0].y, vec![Some(50.0); 4]);
    }

    #[test]
    fn test_ping_rolling_ceiling() {
        let mut builder = ChartBuilder::default();
        let high = builder.ping_chart(&block(10));
        assert_eq!(high.y_axis.range, Some((0.0, 39.0)));

        let mut quiet = block(10);
        quiet.pop_ping_latency_ms = vec![20.0; 10];
        let next = builder.ping_chart(&quiet);
        assert_eq!(next.y_axis.range, Some((0.0, 39.0)));
    }

    #[test]
    fn test_history_window_truncates() {
        let mut builder = ChartBuilder::new(ChartSettings {
            history_records: 5,
            ..Default::default()
        });
        let chart = builder.ping_chart(&block(20));
        assert_eq!(chart.traces[0].x, vec![15.0, 16.0, 17.0, 18.0, 19.0]);
    }

    #[test]
    fn test_downsampled_to_target() {
        let mut builder = ChartBuilder::new(ChartSettings {
            history_records: 600,
            max_data_points: 100,
            ..Default::default()
        });
        let chart = builder.throughput_chart(&block(600));
        assert_eq!(chart.traces.len(), 2);
        assert_eq!(chart.traces[0].len(), 100);
        assert_eq!(chart.traces[0].y[0], Some(120.0));
        assert_eq!(chart.traces[1].y[0], Some(8.0));
        assert!(chart.show_legend);
    }

    #[test]
    fn test_wedge_outline() {
        let (theta, r) = wedge_outline(&[0.1, 0.2, 0.0, 0.0]);
        assert_eq!(theta, vec![-45.0, 45.0, 45.0, 135.0, 135.0, 225.0, 225.0, 315.0]);
        assert_eq!(r[2], Some(0.2));
        assert_eq!(r.len(), 8);
    }

    #[test]
    fn test_obstruction_radial_floor() {
        let status = DishStatus {
            obstruction_stats: vec![ObstructionStats {
                wedge_fraction_obstructed: vec![0.0; 12],
                ..Default::default()
            }],
            ..Default::default()
        };
        let chart = obstruction_chart(&status);
        assert_eq!(chart.y_axis.range, Some((0.0, MIN_OBSTRUCTION_RANGE)));
        assert_eq!(chart.traces.len(), 2);
        assert_eq!(chart.traces[0].x[0], -15.0);
        assert_eq!(chart.x_axis.ticks.as_ref().map(|t| t[2].1.as_str()), Some("E"));
    }

    #[test]
    fn test_speedtest_placeholder() {
        let chart = speedtest_chart(None);
        assert!(chart.is_placeholder());
        assert_eq!(
            chart.annotation.as_ref().map(|a| a.text.as_str()),
            Some(WAITING_TEXT)
        );
        assert_eq!(chart.y_axis.ticks, Some(Vec::new()));

        let empty = SpeedtestHistory::default();
        assert!(speedtest_chart(Some(&empty)).is_placeholder());
    }

    #[test]
    fn test_speedtest_bars() {
        let history = SpeedtestHistory {
            results: vec![SpeedtestResult {
                timestamp: 100.0,
                download: 150e6,
                upload: 12e6,
                ping: 40.0,
                ..Default::default()
            }],
        };
        let chart = speedtest_chart(Some(&history));
        assert_eq!(chart.traces[0].y, vec![Some(150.0)]);
        assert_eq!(chart.traces[1].y, vec![Some(12.0)]);
        let hover = chart.traces[0].hover_text(0).unwrap_or_default();
        assert!(hover.contains("ping: 40.0 ms"));
        assert_eq!(chart.traces[1].hover_text(0), None);
    }

    #[test]
    fn test_build_without_series() {
        let mut builder = ChartBuilder::default();
        let dashboard = builder.build(&TelemetrySnapshot::default(), Revision::Live);
        assert_eq!(dashboard.charts.len(), ChartId::ALL.len());
        assert!(dashboard.revision.is_none());
        assert!(dashboard.get(ChartId::Ping).is_some_and(|c| c.is_empty()));
        assert!(dashboard
            .get(ChartId::Speedtests)
            .is_some_and(|c| c.is_placeholder()));
    }
}
