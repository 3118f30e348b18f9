//! Time-series downsampling for chart rendering
//!
//! Telemetry arrives at one sample per second, so a 24 hour history is far
//! more bars than a chart can show. [`downsample`] shortens a series to
//! roughly a target length while keeping its visual trend.
//!
//! # Algorithm
//!
//! 1. `radius = round(len / target)`. A radius of 1 or less means the series
//!    already fits and it is returned as-is.
//! 2. Every `radius`-th sample is a bucket anchor, giving `ceil(len / radius)`
//!    buckets in chronological order.
//! 3. The k-th bucket (k counts anchors, not original indices) aggregates the
//!    window `[max(0, (k - 1) * radius), (k + 1) * radius + 1)` of the source.
//!    Neighbouring windows overlap, which blurs the series slightly instead of
//!    binning it strictly.
//!
//! A window that ends up empty produces `None` rather than a fabricated zero.
//!
//! # Example
//!
//! ```
//! use starlink_dash::downsample::{downsample, AggregationMethod};
//!
//! let values: Vec<f64> = (1..=10).map(f64::from).collect();
//! let out = downsample(&values, AggregationMethod::Mean, 3);
//! assert_eq!(out, vec![Some(2.5), Some(4.0), Some(7.0), Some(8.5)]);
//! ```

use serde::{Deserialize, Serialize};

/// How the samples inside a bucket window are reduced to one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMethod {
    /// Arithmetic mean of the window
    #[default]
    Mean,
    /// Middle element after sorting the window in descending order
    Median,
    /// Largest value in the window
    Max,
    /// Smallest value in the window
    Min,
}

impl AggregationMethod {
    /// All methods, in display order
    pub const ALL: [AggregationMethod; 4] = [
        AggregationMethod::Mean,
        AggregationMethod::Median,
        AggregationMethod::Max,
        AggregationMethod::Min,
    ];

    /// Reduce a window to a single value, `None` for an empty window
    pub fn aggregate(&self, window: &[f64]) -> Option<f64> {
        if window.is_empty() {
            return None;
        }

        match self {
            AggregationMethod::Mean => Some(window.iter().sum::<f64>() / window.len() as f64),
            AggregationMethod::Median => {
                // Descending order, so len/2 is the lower-middle element
                let mut sorted = window.to_vec();
                sorted.sort_by(|a, b| b.total_cmp(a));
                Some(sorted[sorted.len() / 2])
            }
            AggregationMethod::Max => window.iter().copied().reduce(f64::max),
            AggregationMethod::Min => window.iter().copied().reduce(f64::min),
        }
    }
}

impl std::fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationMethod::Mean => write!(f, "Mean"),
            AggregationMethod::Median => write!(f, "Median"),
            AggregationMethod::Max => write!(f, "Max"),
            AggregationMethod::Min => write!(f, "Min"),
        }
    }
}

impl std::str::FromStr for AggregationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" | "avg" | "average" => Ok(AggregationMethod::Mean),
            "median" => Ok(AggregationMethod::Median),
            "max" => Ok(AggregationMethod::Max),
            "min" => Ok(AggregationMethod::Min),
            other => Err(format!("unknown aggregation method '{}'", other)),
        }
    }
}

/// Stride between bucket anchors for a series of `len` samples
///
/// A `target_len` of zero is treated as one.
pub fn bucket_radius(len: usize, target_len: usize) -> usize {
    let target = target_len.max(1);
    (len as f64 / target as f64).round() as usize
}

/// Downsample `values` to roughly `target_len` samples
///
/// Returns a newly allocated series; the input is never modified. When no
/// aggregation is needed every input value is returned wrapped in `Some`.
pub fn downsample(values: &[f64], method: AggregationMethod, target_len: usize) -> Vec<Option<f64>> {
    let radius = bucket_radius(values.len(), target_len);
    if radius <= 1 {
        return values.iter().copied().map(Some).collect();
    }

    let buckets = values.len().div_ceil(radius);
    (0..buckets)
        .map(|k| method.aggregate(bucket_window(values, k, radius)))
        .collect()
}

/// Downsample a value series together with its timestamps
///
/// Each output bucket carries the timestamp of its anchor sample. The two
/// inputs are paired positionally; extra elements in the longer one are
/// ignored.
pub fn downsample_series(
    timestamps: &[f64],
    values: &[f64],
    method: AggregationMethod,
    target_len: usize,
) -> Vec<(f64, Option<f64>)> {
    let len = timestamps.len().min(values.len());
    let timestamps = &timestamps[..len];
    let values = &values[..len];

    let radius = bucket_radius(len, target_len);
    if radius <= 1 {
        return timestamps
            .iter()
            .zip(values)
            .map(|(&t, &v)| (t, Some(v)))
            .collect();
    }

    timestamps
        .iter()
        .step_by(radius)
        .enumerate()
        .map(|(k, &t)| (t, method.aggregate(bucket_window(values, k, radius))))
        .collect()
}

/// Keep only the most recent `records` samples (the history window)
pub fn most_recent<T>(values: &[T], records: usize) -> &[T] {
    let start = values.len().saturating_sub(records);
    &values[start..]
}

/// Source window aggregated for the k-th bucket
fn bucket_window(values: &[f64], k: usize, radius: usize) -> &[f64] {
    let start = k.saturating_sub(1) * radius;
    let end = ((k + 1) * radius + 1).min(values.len());
    if start >= end {
        return &[];
    }
    &values[start..end]
}
