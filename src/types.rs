//! Shared types passed between the backend worker and the UI
//!
//! - [`ConnectionStatus`] - State of the link to the telemetry server
//! - [`RefreshStats`] - Counters the worker reports after each refresh

use std::time::Duration;

/// Connection status of the telemetry source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No fetch attempted yet, or the source was closed
    #[default]
    Disconnected,
    /// Waiting for the first response
    Connecting,
    /// The last fetch succeeded
    Connected,
    /// Refreshes are paused by the user
    Paused,
    /// The last fetch failed; the next tick retries
    Error,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting..."),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Paused => write!(f, "Paused"),
            ConnectionStatus::Error => write!(f, "Error"),
        }
    }
}

/// Statistics about refreshes since the worker started
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshStats {
    /// Snapshots fetched or received successfully
    pub successful_fetches: u64,
    /// Fetches that failed
    pub failed_fetches: u64,
    /// Duration of the most recent successful fetch
    pub last_fetch_latency: Option<Duration>,
    /// Running average fetch latency in milliseconds
    pub avg_fetch_latency_ms: f64,
    /// Snapshots delivered by the push stream
    pub pushed_snapshots: u64,
    /// Number of messages dropped due to queue backpressure
    pub dropped_messages: u64,
}

impl RefreshStats {
    /// Record a successful fetch that took `latency`
    pub fn record_success(&mut self, latency: Duration) {
        self.successful_fetches += 1;
        self.last_fetch_latency = Some(latency);
        let ms = latency.as_secs_f64() * 1000.0;
        let n = self.successful_fetches as f64;
        self.avg_fetch_latency_ms += (ms - self.avg_fetch_latency_ms) / n;
    }

    /// Record a failed fetch
    pub fn record_failure(&mut self) {
        self.failed_fetches += 1;
    }

    /// Calculate the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.successful_fetches + self.failed_fetches;
        if total == 0 {
            100.0
        } else {
            (self.successful_fetches as f64 / total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let mut stats = RefreshStats::default();
        assert_eq!(stats.success_rate(), 100.0);
        stats.record_success(Duration::from_millis(20));
        stats.record_failure();
        assert_eq!(stats.success_rate(), 50.0);
    }

    #[test]
    fn test_average_latency() {
        let mut stats = RefreshStats::default();
        stats.record_success(Duration::from_millis(10));
        stats.record_success(Duration::from_millis(30));
        assert!((stats.avg_fetch_latency_ms - 20.0).abs() < 1e-9);
        assert_eq!(stats.last_fetch_latency, Some(Duration::from_millis(30)));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ConnectionStatus::Connecting.to_string(), "Connecting...");
    }
}
