//! Telemetry snapshot schema
//!
//! A snapshot is the JSON document the backend serves on `/api/data` or pushes
//! over the stream. Which sections it carries depends on the backend revision
//! and firmware, so every section is optional and the chart layer asks for
//! what it needs instead of assuming a fixed shape.
//!
//! # Sections
//!
//! - `starlink` / `starlink12` / `starlink24` - per-second history ([`SeriesBlock`]),
//!   covering the live window, 12 hours and 24 hours respectively
//! - `status` - obstruction wedges and device identity ([`DishStatus`])
//! - `speedtest` - speed-test results ([`SpeedtestHistory`])

mod de;
pub mod series;
pub mod speedtest;
pub mod status;

pub use de::parse_timestamp;
pub use series::{Metric, SeriesBlock};
pub use speedtest::{ClientInfo, ServerInfo, SpeedtestHistory, SpeedtestResult};
pub use status::{format_uptime, DeviceInfo, DeviceState, DishStatus, ObstructionStats};

use serde::{Deserialize, Serialize};

use crate::error::{DashError, Result};

/// Which history block a snapshot carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Revision {
    /// `starlink`: the live window requested with `secs_history`
    #[default]
    Live,
    /// `starlink12`: the last 12 hours
    TwelveHour,
    /// `starlink24`: the last 24 hours
    Day,
}

impl Revision {
    /// Lookup order when the preferred block is missing
    pub const FALLBACK_ORDER: [Revision; 3] = [Revision::Live, Revision::TwelveHour, Revision::Day];

    /// JSON key of the block
    pub fn key(&self) -> &'static str {
        match self {
            Revision::Live => "starlink",
            Revision::TwelveHour => "starlink12",
            Revision::Day => "starlink24",
        }
    }

    /// Block that best covers a history of `secs` seconds
    pub fn for_history_secs(secs: u64) -> Self {
        if secs > 12 * 3600 {
            Revision::Day
        } else if secs > 3600 {
            Revision::TwelveHour
        } else {
            Revision::Live
        }
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One full telemetry payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starlink: Option<SeriesBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starlink12: Option<SeriesBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starlink24: Option<SeriesBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DishStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speedtest: Option<SpeedtestHistory>,
}

impl TelemetrySnapshot {
    /// Parse a snapshot and check its history blocks line up
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: TelemetrySnapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// History block for a revision, if present
    pub fn block(&self, revision: Revision) -> Option<&SeriesBlock> {
        match revision {
            Revision::Live => self.starlink.as_ref(),
            Revision::TwelveHour => self.starlink12.as_ref(),
            Revision::Day => self.starlink24.as_ref(),
        }
    }

    /// The preferred history block, or the first one present
    pub fn series(&self, preferred: Revision) -> Option<(Revision, &SeriesBlock)> {
        if let Some(block) = self.block(preferred) {
            return Some((preferred, block));
        }
        Revision::FALLBACK_ORDER
            .iter()
            .find_map(|rev| self.block(*rev).map(|block| (*rev, block)))
    }

    /// Speed-test history when at least one result exists
    pub fn speedtests(&self) -> Option<&SpeedtestHistory> {
        self.speedtest.as_ref().filter(|h| !h.is_empty())
    }

    /// Check every history block for ragged columns
    pub fn validate(&self) -> Result<()> {
        for rev in Revision::FALLBACK_ORDER {
            if let Some(block) = self.block(rev) {
                block
                    .validate()
                    .map_err(|e| e.with_context(format!("in '{}'", rev.key())))?;
            }
        }
        Ok(())
    }

    /// Whether the snapshot carries nothing the dashboard can draw
    pub fn is_empty(&self) -> bool {
        Revision::FALLBACK_ORDER
            .iter()
            .all(|rev| self.block(*rev).is_none_or(|b| b.is_empty()))
            && self.status.is_none()
            && self.speedtests().is_none()
    }
}

impl std::str::FromStr for TelemetrySnapshot {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_for_history() {
        assert_eq!(Revision::for_history_secs(600), Revision::Live);
        assert_eq!(Revision::for_history_secs(3600), Revision::Live);
        assert_eq!(Revision::for_history_secs(6 * 3600), Revision::TwelveHour);
        assert_eq!(Revision::for_history_secs(24 * 3600), Revision::Day);
    }

    #[test]
    fn test_series_prefers_requested_block() {
        let json = r#"{
            "starlink": {"timestamp": [1.0], "snr": [9.0]},
            "starlink24": {"timestamp": [1.0, 2.0], "snr": [9.0, 8.0]}
        }"#;
        let snap = TelemetrySnapshot::from_json(json).unwrap();
        let (rev, block) = snap.series(Revision::Day).unwrap();
        assert_eq!(rev, Revision::Day);
        assert_eq!(block.len(), 2);

        let (rev, _) = snap.series(Revision::TwelveHour).unwrap();
        assert_eq!(rev, Revision::Live);
    }

    #[test]
    fn test_ragged_block_is_payload_error() {
        let json = r#"{"starlink12": {"timestamp": [1.0, 2.0], "snr": [9.0]}}"#;
        let err = TelemetrySnapshot::from_json(json).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("starlink12"), "{}", text);
        assert!(text.contains("snr"), "{}", text);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = TelemetrySnapshot::from_json("{}").unwrap();
        assert!(snap.is_empty());
        assert!(snap.series(Revision::Live).is_none());

        let snap = TelemetrySnapshot::from_json(r#"{"speedtest": []}"#).unwrap();
        assert!(snap.speedtests().is_none());
        assert!(snap.is_empty());
    }

    #[test]
    fn test_unknown_sections_ignored() {
        let snap: TelemetrySnapshot =
            r#"{"starlink": {"timestamp": [], "index": [1, 2]}, "ip": "10.0.0.2"}"#.parse().unwrap();
        assert!(snap.starlink.is_some());
    }
}
