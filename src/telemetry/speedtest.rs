//! Speed-test history
//!
//! The backend keeps a list of speed-test results. Depending on the revision
//! it is sent as a list of result records or as parallel arrays keyed by
//! field. Both normalize to a list of [`SpeedtestResult`].

use serde::{Deserialize, Serialize};

use super::de::{flexible_timestamp, nullable_f64_vec};

/// Client side of a speed test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default)]
    pub isp: String,
}

/// Test server used for a speed test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub sponsor: String,
    #[serde(default)]
    pub name: String,
}

/// One completed speed test
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpeedtestResult {
    /// Unix seconds
    pub timestamp: f64,
    /// Bits per second
    pub download: f64,
    /// Bits per second
    pub upload: f64,
    /// Milliseconds
    pub ping: f64,
    pub bytes_sent: f64,
    pub bytes_received: f64,
    pub client: ClientInfo,
    pub server: ServerInfo,
}

impl SpeedtestResult {
    pub fn download_mbps(&self) -> f64 {
        self.download / 1e6
    }

    pub fn upload_mbps(&self) -> f64 {
        self.upload / 1e6
    }

    /// Multi-line summary shown when hovering a result
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("ISP: {}", self.client.isp),
            format!("host: {} ({})", self.server.sponsor, self.server.name),
            format!("ping: {:.1} ms", self.ping),
            format!(
                "download: {:.0} Mbps (rec: {:.0} MB)",
                self.download_mbps(),
                self.bytes_received / 1e6
            ),
            format!(
                "upload: {:.0} Mbps (sent: {:.0} MB)",
                self.upload_mbps(),
                self.bytes_sent / 1e6
            ),
        ]
    }
}

/// All speed tests known to the backend, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SpeedtestPayload")]
pub struct SpeedtestHistory {
    pub results: Vec<SpeedtestResult>,
}

impl SpeedtestHistory {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn latest(&self) -> Option<&SpeedtestResult> {
        self.results.last()
    }
}

#[derive(Debug, Default, Deserialize)]
struct SpeedtestColumns {
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    timestamp: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    download: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    upload: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    ping: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    bytes_sent: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    bytes_received: Vec<f64>,
    #[serde(default)]
    client: Vec<ClientInfo>,
    #[serde(default)]
    server: Vec<ServerInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct SpeedtestRecord {
    #[serde(default, deserialize_with = "flexible_timestamp")]
    timestamp: Option<f64>,
    #[serde(default)]
    download: Option<f64>,
    #[serde(default)]
    upload: Option<f64>,
    #[serde(default)]
    ping: Option<f64>,
    #[serde(default)]
    bytes_sent: Option<f64>,
    #[serde(default)]
    bytes_received: Option<f64>,
    #[serde(default)]
    client: ClientInfo,
    #[serde(default)]
    server: ServerInfo,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SpeedtestPayload {
    Records(Vec<SpeedtestRecord>),
    Wrapped { results: Vec<SpeedtestRecord> },
    Columns(SpeedtestColumns),
}

impl From<SpeedtestPayload> for SpeedtestHistory {
    fn from(payload: SpeedtestPayload) -> Self {
        let results = match payload {
            SpeedtestPayload::Records(records) | SpeedtestPayload::Wrapped { results: records } => {
                records
                    .into_iter()
                    .filter_map(|r| {
                        Some(SpeedtestResult {
                            timestamp: r.timestamp?,
                            download: r.download.unwrap_or(0.0),
                            upload: r.upload.unwrap_or(0.0),
                            ping: r.ping.unwrap_or(f64::NAN),
                            bytes_sent: r.bytes_sent.unwrap_or(0.0),
                            bytes_received: r.bytes_received.unwrap_or(0.0),
                            client: r.client,
                            server: r.server,
                        })
                    })
                    .collect()
            }
            SpeedtestPayload::Columns(c) => {
                let at = |v: &[f64], i: usize, fallback: f64| v.get(i).copied().unwrap_or(fallback);
                (0..c.timestamp.len())
                    .map(|i| SpeedtestResult {
                        timestamp: c.timestamp[i],
                        download: at(&c.download, i, 0.0),
                        upload: at(&c.upload, i, 0.0),
                        ping: at(&c.ping, i, f64::NAN),
                        bytes_sent: at(&c.bytes_sent, i, 0.0),
                        bytes_received: at(&c.bytes_received, i, 0.0),
                        client: c.client.get(i).cloned().unwrap_or_default(),
                        server: c.server.get(i).cloned().unwrap_or_default(),
                    })
                    .collect()
            }
        };
        SpeedtestHistory { results }
    }
}
