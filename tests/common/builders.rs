//! Test data builders for creating test objects

use starlink_dash::telemetry::{
    DishStatus, ObstructionStats, SeriesBlock, SpeedtestHistory, SpeedtestResult,
};
use starlink_dash::TelemetrySnapshot;

/// Builder for a history block sampled once per second
pub struct SeriesBlockBuilder {
    start: f64,
    len: usize,
    ping: f64,
    drop_rate: f64,
    snr: f64,
    down_bps: f64,
    up_bps: f64,
}

impl SeriesBlockBuilder {
    pub fn new(len: usize) -> Self {
        Self {
            start: 1_760_000_000.0,
            len,
            ping: 35.0,
            drop_rate: 0.0,
            snr: 9.0,
            down_bps: 150e6,
            up_bps: 12e6,
        }
    }

    pub fn start(mut self, start: f64) -> Self {
        self.start = start;
        self
    }

    pub fn ping(mut self, ping: f64) -> Self {
        self.ping = ping;
        self
    }

    pub fn drop_rate(mut self, drop_rate: f64) -> Self {
        self.drop_rate = drop_rate;
        self
    }

    pub fn snr(mut self, snr: f64) -> Self {
        self.snr = snr;
        self
    }

    pub fn throughput(mut self, down_bps: f64, up_bps: f64) -> Self {
        self.down_bps = down_bps;
        self.up_bps = up_bps;
        self
    }

    pub fn build(self) -> SeriesBlock {
        let n = self.len;
        SeriesBlock {
            timestamp: (0..n).map(|i| self.start + i as f64).collect(),
            pop_ping_latency_ms: vec![self.ping; n],
            pop_ping_drop_rate: vec![self.drop_rate; n],
            snr: vec![self.snr; n],
            downlink_throughput_bps: vec![self.down_bps; n],
            uplink_throughput_bps: vec![self.up_bps; n],
            scheduled: vec![Some(true); n],
            obstructed: vec![Some(false); n],
        }
    }
}

/// Builder for a whole snapshot
#[derive(Default)]
pub struct SnapshotBuilder {
    snapshot: TelemetrySnapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(mut self, block: SeriesBlock) -> Self {
        self.snapshot.starlink = Some(block);
        self
    }

    pub fn twelve_hour(mut self, block: SeriesBlock) -> Self {
        self.snapshot.starlink12 = Some(block);
        self
    }

    pub fn obstructions(mut self, wedges: Vec<Vec<f64>>) -> Self {
        let status = self.snapshot.status.get_or_insert_with(DishStatus::default);
        status.obstruction_stats = wedges
            .into_iter()
            .map(|w| ObstructionStats {
                wedge_fraction_obstructed: w,
                ..Default::default()
            })
            .collect();
        self
    }

    pub fn speedtest(mut self, timestamp: f64, download_bps: f64, upload_bps: f64) -> Self {
        let history = self.snapshot.speedtest.get_or_insert_with(SpeedtestHistory::default);
        history.results.push(SpeedtestResult {
            timestamp,
            download: download_bps,
            upload: upload_bps,
            ping: 30.0,
            ..Default::default()
        });
        self
    }

    pub fn build(self) -> TelemetrySnapshot {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_block_builder() {
        let block = SeriesBlockBuilder::new(5).start(100.0).snr(7.0).build();

        assert_eq!(block.len(), 5);
        assert_eq!(block.timestamp[4], 104.0);
        assert_eq!(block.snr, vec![7.0; 5]);
        assert!(block.validate().is_ok());
    }
}
