//! HTTP polling source
//!
//! Fetches `GET {base_url}/api/data` on every refresh with a blocking ureq
//! agent. Speed tests are triggered with `GET {base_url}/api/trigger_speedtest`
//! from a short-lived thread so the worker never waits for the test.

use std::time::{Duration, Instant};

use super::source::{PushSink, TelemetrySource};
use crate::config::ServerConfig;
use crate::error::{DashError, Result, ResultExt};
use crate::telemetry::TelemetrySnapshot;

/// Largest response body accepted; a 24 hour history is several megabytes
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

const USER_AGENT: &str = concat!("starlink-dash/", env!("CARGO_PKG_VERSION"));

fn build_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    ureq::Agent::new_with_config(config)
}

/// Polls the REST endpoint
pub struct HttpPollSource {
    agent: ureq::Agent,
    data_url: String,
    trigger: SpeedtestTrigger,
}

impl HttpPollSource {
    pub fn new(server: &ServerConfig, timeout: Duration) -> Self {
        Self {
            agent: build_agent(timeout),
            data_url: server.data_url(),
            trigger: SpeedtestTrigger::new(server.trigger_speedtest_url(), timeout),
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

impl TelemetrySource for HttpPollSource {
    fn describe(&self) -> String {
        format!("poll {}", self.data_url)
    }

    fn fetch(&mut self, _history_secs: u64) -> Result<TelemetrySnapshot> {
        let start = Instant::now();
        let mut response = self
            .agent
            .get(&self.data_url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .call()
            .map_err(DashError::from_ureq_error)
            .with_context(|| format!("GET {}", self.data_url))?;

        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_string()
            .map_err(DashError::from_ureq_error)
            .with_context(|| format!("reading body of {}", self.data_url))?;

        let snapshot = TelemetrySnapshot::from_json(&body)?;
        tracing::debug!(
            "Fetched {} bytes from {} in {:?}",
            body.len(),
            self.data_url,
            start.elapsed()
        );
        Ok(snapshot)
    }

    fn subscribe(&mut self, _history_secs: u64, _sink: PushSink) -> Result<()> {
        Err(DashError::NotConnected(
            "the HTTP source is polled, it has no stream".to_string(),
        ))
    }

    fn trigger_speedtest(&mut self) -> Result<()> {
        self.trigger.fire()
    }
}

/// Fire-and-forget speed-test trigger shared by the poll and push sources
#[derive(Debug, Clone)]
pub struct SpeedtestTrigger {
    url: String,
    timeout: Duration,
}

impl SpeedtestTrigger {
    pub fn new(url: String, timeout: Duration) -> Self {
        Self { url, timeout }
    }

    /// Send the trigger request from a background thread
    pub fn fire(&self) -> Result<()> {
        let url = self.url.clone();
        let timeout = self.timeout;
        std::thread::Builder::new()
            .name("speedtest-trigger".to_string())
            .spawn(move || {
                let agent = build_agent(timeout);
                match agent.get(&url).header("User-Agent", USER_AGENT).call() {
                    Ok(response) => {
                        tracing::info!("Speed test triggered ({})", response.status())
                    }
                    Err(e) => tracing::warn!(
                        "Speed test trigger failed: {}",
                        DashError::from_ureq_error(e)
                    ),
                }
            })
            .map(|_| ())
            .map_err(DashError::Io)
    }
}
