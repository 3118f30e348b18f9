//! Runtime settings that can be modified while the dashboard is running
//!
//! These are separate from the persistent [`AppConfig`](super::AppConfig):
//! they describe what the user is looking at right now (history range,
//! paused state) and are rebuilt from the config and app state on startup.

use serde::{Deserialize, Serialize};

/// History lengths offered by the selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HistoryRange {
    #[default]
    TenMinutes,
    OneHour,
    SixHours,
    TwelveHours,
    Day,
}

impl HistoryRange {
    pub const ALL: [HistoryRange; 5] = [
        HistoryRange::TenMinutes,
        HistoryRange::OneHour,
        HistoryRange::SixHours,
        HistoryRange::TwelveHours,
        HistoryRange::Day,
    ];

    /// Length of the range in seconds
    pub fn secs(&self) -> u64 {
        match self {
            HistoryRange::TenMinutes => 600,
            HistoryRange::OneHour => 3_600,
            HistoryRange::SixHours => 6 * 3_600,
            HistoryRange::TwelveHours => 12 * 3_600,
            HistoryRange::Day => 24 * 3_600,
        }
    }

    /// Number of one-per-second samples covering the range
    pub fn records(&self) -> usize {
        self.secs() as usize
    }

    pub fn label(&self) -> &'static str {
        match self {
            HistoryRange::TenMinutes => "10 minutes",
            HistoryRange::OneHour => "1 hour",
            HistoryRange::SixHours => "6 hours",
            HistoryRange::TwelveHours => "12 hours",
            HistoryRange::Day => "24 hours",
        }
    }

    /// The offered range closest to `secs`
    pub fn from_secs(secs: u64) -> Self {
        Self::ALL
            .iter()
            .copied()
            .min_by_key(|r| r.secs().abs_diff(secs))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Runtime settings for the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Whether scheduled refreshes are paused
    pub paused: bool,

    /// Selected history range
    pub history: HistoryRange,
}

impl RuntimeSettings {
    /// Create runtime settings starting at a history length from the config
    pub fn new(history_secs: u64) -> Self {
        Self {
            paused: false,
            history: HistoryRange::from_secs(history_secs),
        }
    }

    /// Flip the paused flag, returning the new value
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Select a history range, returning whether it changed
    pub fn set_history(&mut self, history: HistoryRange) -> bool {
        let changed = self.history != history;
        self.history = history;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_range_secs() {
        assert_eq!(HistoryRange::TenMinutes.secs(), 600);
        assert_eq!(HistoryRange::Day.records(), 86_400);
        assert_eq!(HistoryRange::OneHour.to_string(), "1 hour");
    }

    #[test]
    fn test_history_from_secs_picks_nearest() {
        assert_eq!(HistoryRange::from_secs(600), HistoryRange::TenMinutes);
        assert_eq!(HistoryRange::from_secs(0), HistoryRange::TenMinutes);
        assert_eq!(HistoryRange::from_secs(5 * 3_600), HistoryRange::SixHours);
        assert_eq!(HistoryRange::from_secs(100 * 3_600), HistoryRange::Day);
    }

    #[test]
    fn test_runtime_settings() {
        let mut settings = RuntimeSettings::new(3_600);
        assert_eq!(settings.history, HistoryRange::OneHour);
        assert!(settings.toggle_pause());
        assert!(!settings.toggle_pause());
        assert!(!settings.set_history(HistoryRange::OneHour));
        assert!(settings.set_history(HistoryRange::Day));
    }
}
