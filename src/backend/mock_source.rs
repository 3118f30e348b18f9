//! Simulated telemetry for running the dashboard without a server
//!
//! Every sample is derived from its own timestamp, so two refreshes that
//! overlap in time agree on the shared seconds and the charts scroll
//! smoothly instead of reshuffling.
//!
//! # Generated data
//!
//! - Ping latency oscillates around 40 ms with occasional spikes
//! - Ping drop is mostly zero with short bursts
//! - SNR sits at 9 and dips while "obstructed"
//! - Throughput varies between a few and ~180 Mbps down
//! - A fixed obstruction pattern over 12 wedges
//! - Speed tests appear each time one is triggered

use chrono::Utc;

use super::source::{PushSink, TelemetrySource};
use crate::error::{DashError, Result};
use crate::telemetry::{
    ClientInfo, DeviceInfo, DeviceState, DishStatus, ObstructionStats, Revision, SeriesBlock,
    ServerInfo, SpeedtestHistory, SpeedtestResult, TelemetrySnapshot,
};

const WEDGE_COUNT: usize = 12;

/// Base obstruction per wedge; the dish sees a tree line to the north-west
const WEDGE_PROFILE: [f64; WEDGE_COUNT] = [
    0.004, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.006, 0.021, 0.034, 0.012,
];

/// Salts keep the per-column noise independent
const SALT_PING: u64 = 1;
const SALT_DROP: u64 = 2;
const SALT_OBSTRUCTED: u64 = 3;
const SALT_DOWN: u64 = 4;
const SALT_UP: u64 = 5;
const SALT_SCHEDULED: u64 = 6;
const SALT_SPEEDTEST: u64 = 7;

/// Deterministic noise in `[0, 1)` for a second and a salt (splitmix64)
fn noise(second: i64, salt: u64) -> f64 {
    let mut z = (second as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(salt.wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}

/// Generates snapshots instead of fetching them
#[derive(Debug, Default)]
pub struct SimulatedSource {
    speedtests: Vec<SpeedtestResult>,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of speed tests triggered so far
    pub fn speedtest_count(&self) -> usize {
        self.speedtests.len()
    }

    /// Snapshot of `history_secs` one-second samples ending at `end` (Unix seconds)
    pub fn snapshot_at(&self, end: i64, history_secs: u64) -> TelemetrySnapshot {
        let block = series_block(end, history_secs.max(1));
        let mut snapshot = TelemetrySnapshot {
            status: Some(dish_status(end)),
            speedtest: (!self.speedtests.is_empty()).then(|| SpeedtestHistory {
                results: self.speedtests.clone(),
            }),
            ..Default::default()
        };
        match Revision::for_history_secs(history_secs) {
            Revision::Live => snapshot.starlink = Some(block),
            Revision::TwelveHour => snapshot.starlink12 = Some(block),
            Revision::Day => snapshot.starlink24 = Some(block),
        }
        snapshot
    }

    /// Record a speed test finished at `at` (Unix seconds)
    pub fn record_speedtest(&mut self, at: i64) {
        let download = 40e6 + noise(at, SALT_SPEEDTEST) * 160e6;
        let upload = 5e6 + noise(at, SALT_SPEEDTEST + 1) * 20e6;
        self.speedtests.push(SpeedtestResult {
            timestamp: at as f64,
            download,
            upload,
            ping: 25.0 + noise(at, SALT_SPEEDTEST + 2) * 30.0,
            // Ten second test at the measured rates
            bytes_sent: upload * 10.0 / 8.0,
            bytes_received: download * 10.0 / 8.0,
            client: ClientInfo {
                isp: "Simulated ISP".to_string(),
            },
            server: ServerInfo {
                sponsor: "Local Test".to_string(),
                name: "localhost".to_string(),
            },
        });
    }
}

impl TelemetrySource for SimulatedSource {
    fn describe(&self) -> String {
        "mock data".to_string()
    }

    fn fetch(&mut self, history_secs: u64) -> Result<TelemetrySnapshot> {
        Ok(self.snapshot_at(Utc::now().timestamp(), history_secs))
    }

    fn subscribe(&mut self, _history_secs: u64, _sink: PushSink) -> Result<()> {
        Err(DashError::NotConnected(
            "mock data is polled, it has no stream".to_string(),
        ))
    }

    fn trigger_speedtest(&mut self) -> Result<()> {
        self.record_speedtest(Utc::now().timestamp());
        tracing::info!("Recorded simulated speed test #{}", self.speedtests.len());
        Ok(())
    }
}

fn series_block(end: i64, samples: u64) -> SeriesBlock {
    let n = samples as usize;
    let mut block = SeriesBlock {
        timestamp: Vec::with_capacity(n),
        pop_ping_latency_ms: Vec::with_capacity(n),
        pop_ping_drop_rate: Vec::with_capacity(n),
        snr: Vec::with_capacity(n),
        downlink_throughput_bps: Vec::with_capacity(n),
        uplink_throughput_bps: Vec::with_capacity(n),
        scheduled: Vec::with_capacity(n),
        obstructed: Vec::with_capacity(n),
    };

    let start = end - samples as i64 + 1;
    for second in start..=end {
        let t = second as f64;
        let obstructed = noise(second / 20, SALT_OBSTRUCTED) < 0.03;
        let scheduled = noise(second / 60, SALT_SCHEDULED) > 0.01;

        let mut ping = 40.0 + 8.0 * (t / 45.0).sin() + noise(second, SALT_PING) * 10.0;
        if noise(second, SALT_PING + 100) > 0.98 {
            ping += 80.0;
        }
        let drop = if obstructed || !scheduled {
            1.0
        } else if noise(second, SALT_DROP) > 0.97 {
            noise(second, SALT_DROP + 100) * 0.2
        } else {
            0.0
        };
        let snr = if obstructed {
            (noise(second, SALT_OBSTRUCTED + 100) * 6.0).floor()
        } else {
            9.0
        };
        let down = if drop >= 1.0 {
            0.0
        } else {
            5e6 + (0.5 + 0.5 * (t / 300.0).sin()) * 150e6 * noise(second, SALT_DOWN)
        };
        let up = if drop >= 1.0 {
            0.0
        } else {
            0.5e6 + 15e6 * noise(second, SALT_UP)
        };

        block.timestamp.push(t);
        block.pop_ping_latency_ms.push(ping);
        block.pop_ping_drop_rate.push(drop);
        block.snr.push(snr);
        block.downlink_throughput_bps.push(down);
        block.uplink_throughput_bps.push(up);
        block.scheduled.push(Some(scheduled));
        block.obstructed.push(Some(obstructed));
    }
    block
}

fn dish_status(end: i64) -> DishStatus {
    // Three reports a minute apart, the latest one a little worse
    let obstruction_stats = (0..3)
        .map(|k| {
            let wedges: Vec<f64> = WEDGE_PROFILE
                .iter()
                .enumerate()
                .map(|(i, base)| {
                    let jitter = noise(end / 60 - k, SALT_OBSTRUCTED + i as u64) * 0.004;
                    if *base > 0.0 {
                        base + jitter
                    } else {
                        0.0
                    }
                })
                .collect();
            let total = wedges.iter().sum::<f64>() / WEDGE_COUNT as f64;
            ObstructionStats {
                wedge_fraction_obstructed: wedges,
                fraction_obstructed: Some(total),
                currently_obstructed: Some(false),
            }
        })
        .rev()
        .collect();

    DishStatus {
        obstruction_stats,
        device_info: vec![DeviceInfo {
            id: Some("ut00000000-00000000-simulated".to_string()),
            hardware_version: Some("rev4_prod1".to_string()),
            software_version: Some("simulated".to_string()),
            country_code: Some("US".to_string()),
        }],
        device_state: vec![DeviceState {
            uptime_s: Some((end.rem_euclid(7 * 86_400)) as u64),
        }],
    }
}
