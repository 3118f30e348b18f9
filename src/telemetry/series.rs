//! Per-second terminal history as parallel arrays
//!
//! Backends send the history either as an object of equal-length arrays
//! (`{"timestamp": [...], "snr": [...]}`) or, in older revisions, as a list of
//! status records (`[{"timestamp": ..., "snr": ...}, ...]`). Both shapes
//! deserialize into the same [`SeriesBlock`].

use serde::{Deserialize, Serialize};

use super::de::{flexible_timestamp, nullable_bool_vec, nullable_f64_vec};
use crate::error::{DashError, Result};

/// A numeric column of the series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    PingLatencyMs,
    PingDropRate,
    Snr,
    DownlinkThroughputBps,
    UplinkThroughputBps,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::PingLatencyMs,
        Metric::PingDropRate,
        Metric::Snr,
        Metric::DownlinkThroughputBps,
        Metric::UplinkThroughputBps,
    ];

    /// JSON field name of the column
    pub fn field_name(&self) -> &'static str {
        match self {
            Metric::PingLatencyMs => "popPingLatencyMs",
            Metric::PingDropRate => "popPingDropRate",
            Metric::Snr => "snr",
            Metric::DownlinkThroughputBps => "downlinkThroughputBps",
            Metric::UplinkThroughputBps => "uplinkThroughputBps",
        }
    }
}

/// Terminal history, one entry per sample in every column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SeriesPayload", rename_all = "camelCase")]
pub struct SeriesBlock {
    /// Sample times in Unix seconds
    pub timestamp: Vec<f64>,
    pub pop_ping_latency_ms: Vec<f64>,
    /// Fraction of pings dropped, 0.0 to 1.0
    pub pop_ping_drop_rate: Vec<f64>,
    pub snr: Vec<f64>,
    pub downlink_throughput_bps: Vec<f64>,
    pub uplink_throughput_bps: Vec<f64>,
    /// Whether the terminal was scheduled for service; `None` means unknown
    pub scheduled: Vec<Option<bool>>,
    pub obstructed: Vec<Option<bool>>,
}

impl SeriesBlock {
    /// Number of samples (length of the timestamp column)
    pub fn len(&self) -> usize {
        self.timestamp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
    }

    /// Values of a numeric column
    pub fn metric(&self, metric: Metric) -> &[f64] {
        match metric {
            Metric::PingLatencyMs => &self.pop_ping_latency_ms,
            Metric::PingDropRate => &self.pop_ping_drop_rate,
            Metric::Snr => &self.snr,
            Metric::DownlinkThroughputBps => &self.downlink_throughput_bps,
            Metric::UplinkThroughputBps => &self.uplink_throughput_bps,
        }
    }

    /// Whether the backend sent this column at all
    pub fn has(&self, metric: Metric) -> bool {
        !self.metric(metric).is_empty()
    }

    /// Check that every column that was sent lines up with the timestamps
    ///
    /// Columns the backend did not send are empty and are not an error.
    pub fn validate(&self) -> Result<()> {
        let expected = self.len();
        let mut lengths: Vec<(&str, usize)> = Metric::ALL
            .iter()
            .map(|m| (m.field_name(), self.metric(*m).len()))
            .collect();
        lengths.push(("scheduled", self.scheduled.len()));
        lengths.push(("obstructed", self.obstructed.len()));

        for (name, len) in lengths {
            if len != 0 && len != expected {
                return Err(DashError::Payload(format!(
                    "{} has {} samples, expected {}",
                    name, len, expected
                )));
            }
        }
        Ok(())
    }

    /// Keep only the most recent `records` samples of every column
    pub fn truncate_to_recent(&mut self, records: usize) {
        fn keep_tail<T>(v: &mut Vec<T>, records: usize) {
            let excess = v.len().saturating_sub(records);
            v.drain(..excess);
        }

        keep_tail(&mut self.timestamp, records);
        keep_tail(&mut self.pop_ping_latency_ms, records);
        keep_tail(&mut self.pop_ping_drop_rate, records);
        keep_tail(&mut self.snr, records);
        keep_tail(&mut self.downlink_throughput_bps, records);
        keep_tail(&mut self.uplink_throughput_bps, records);
        keep_tail(&mut self.scheduled, records);
        keep_tail(&mut self.obstructed, records);
    }
}

/// Parallel-array wire form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesColumns {
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    timestamp: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    pop_ping_latency_ms: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    pop_ping_drop_rate: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    snr: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    downlink_throughput_bps: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    uplink_throughput_bps: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_bool_vec")]
    scheduled: Vec<Option<bool>>,
    #[serde(default, deserialize_with = "nullable_bool_vec")]
    obstructed: Vec<Option<bool>>,
}

/// One status record of the list wire form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesRecord {
    #[serde(default, deserialize_with = "flexible_timestamp")]
    timestamp: Option<f64>,
    pop_ping_latency_ms: Option<f64>,
    pop_ping_drop_rate: Option<f64>,
    snr: Option<f64>,
    downlink_throughput_bps: Option<f64>,
    uplink_throughput_bps: Option<f64>,
    scheduled: Option<bool>,
    obstructed: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeriesPayload {
    Columns(SeriesColumns),
    Records(Vec<SeriesRecord>),
}

impl From<SeriesPayload> for SeriesBlock {
    fn from(payload: SeriesPayload) -> Self {
        match payload {
            SeriesPayload::Columns(c) => SeriesBlock {
                timestamp: c.timestamp,
                pop_ping_latency_ms: c.pop_ping_latency_ms,
                pop_ping_drop_rate: c.pop_ping_drop_rate,
                snr: c.snr,
                downlink_throughput_bps: c.downlink_throughput_bps,
                uplink_throughput_bps: c.uplink_throughput_bps,
                scheduled: c.scheduled,
                obstructed: c.obstructed,
            },
            SeriesPayload::Records(records) => {
                // Records without a time cannot be placed on an axis
                let records: Vec<SeriesRecord> =
                    records.into_iter().filter(|r| r.timestamp.is_some()).collect();
                let nan = |v: Option<f64>| v.unwrap_or(f64::NAN);

                SeriesBlock {
                    timestamp: records.iter().map(|r| nan(r.timestamp)).collect(),
                    pop_ping_latency_ms: records.iter().map(|r| nan(r.pop_ping_latency_ms)).collect(),
                    pop_ping_drop_rate: records.iter().map(|r| nan(r.pop_ping_drop_rate)).collect(),
                    snr: records.iter().map(|r| nan(r.snr)).collect(),
                    downlink_throughput_bps: records
                        .iter()
                        .map(|r| nan(r.downlink_throughput_bps))
                        .collect(),
                    uplink_throughput_bps: records
                        .iter()
                        .map(|r| nan(r.uplink_throughput_bps))
                        .collect(),
                    scheduled: records.iter().map(|r| r.scheduled).collect(),
                    obstructed: records.iter().map(|r| r.obstructed).collect(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_columns() {
        let json = r#"{
            "timestamp": [1.0, 2.0, 3.0],
            "popPingLatencyMs": [30.5, null, 41.0],
            "snr": [9.0, 8.5, 7.0],
            "scheduled": [true, null, false],
            "obstructed": [false, false, true]
        }"#;
        let block: SeriesBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block.len(), 3);
        assert!(block.pop_ping_latency_ms[1].is_nan());
        assert_eq!(block.scheduled, vec![Some(true), None, Some(false)]);
        assert!(!block.has(Metric::PingDropRate));
        assert!(block.validate().is_ok());
    }

    #[test]
    fn test_parse_records() {
        let json = r#"[
            {"timestamp": 100.0, "popPingLatencyMs": 35.0, "snr": 9.0},
            {"popPingLatencyMs": 99.0},
            {"timestamp": "Tue, 14 Nov 2023 22:13:20 GMT", "popPingLatencyMs": 40.0, "obstructed": true}
        ]"#;
        let block: SeriesBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block.timestamp, vec![100.0, 1_700_000_000.0]);
        assert_eq!(block.pop_ping_latency_ms, vec![35.0, 40.0]);
        assert!(block.snr[1].is_nan());
        assert_eq!(block.obstructed, vec![None, Some(true)]);
    }

    #[test]
    fn test_validate_rejects_ragged_columns() {
        let block = SeriesBlock {
            timestamp: vec![1.0, 2.0],
            snr: vec![9.0],
            ..Default::default()
        };
        let err = block.validate().unwrap_err();
        assert!(err.to_string().contains("snr has 1 samples, expected 2"));
    }

    #[test]
    fn test_truncate_to_recent() {
        let mut block = SeriesBlock {
            timestamp: vec![1.0, 2.0, 3.0, 4.0],
            snr: vec![9.0, 8.0, 7.0, 6.0],
            scheduled: vec![Some(true), None, Some(false), Some(true)],
            ..Default::default()
        };
        block.truncate_to_recent(2);
        assert_eq!(block.timestamp, vec![3.0, 4.0]);
        assert_eq!(block.snr, vec![7.0, 6.0]);
        assert_eq!(block.scheduled, vec![Some(false), Some(true)]);
        assert!(block.validate().is_ok());
    }

    #[test]
    fn test_serialize_as_columns() {
        let block = SeriesBlock {
            timestamp: vec![1.0],
            snr: vec![9.0],
            ..Default::default()
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["snr"], serde_json::json!([9.0]));
        assert!(json.get("popPingLatencyMs").is_some());
    }
}
