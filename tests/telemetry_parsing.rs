//! Integration tests for telemetry payload parsing
//!
//! Covers both wire shapes of the history blocks and speed tests, plus the
//! terminal status section.

mod common;

use common::{assert_float_eq, load_fixture};
use starlink_dash::telemetry::Revision;
use starlink_dash::{DashError, TelemetrySnapshot};

#[test]
fn test_parse_column_payload() {
    let snapshot = TelemetrySnapshot::from_json(&load_fixture("poll_columns.json")).unwrap();

    let live = snapshot.starlink.as_ref().expect("live block");
    assert_eq!(live.len(), 6);
    assert_eq!(live.timestamp[0], 1_760_000_000.0);
    // null latency becomes NaN rather than failing the payload
    assert!(live.pop_ping_latency_ms[2].is_nan());
    assert_eq!(live.scheduled[3], None);
    assert_eq!(live.obstructed[3], Some(true));

    // Columns the 12 hour block leaves out are empty
    let twelve = snapshot.starlink12.as_ref().expect("12h block");
    assert_eq!(twelve.len(), 3);
    assert!(twelve.downlink_throughput_bps.is_empty());
    assert!(snapshot.starlink24.is_none());
}

#[test]
fn test_parse_status_section() {
    let snapshot = TelemetrySnapshot::from_json(&load_fixture("poll_columns.json")).unwrap();
    let status = snapshot.status.as_ref().expect("status");

    assert_eq!(status.obstruction_stats.len(), 2);
    let max = status.max_wedges();
    assert_eq!(max.len(), 12);
    assert_float_eq(max[1], 0.05, 1e-12);
    assert_float_eq(max[2], 0.11, 1e-12);
    assert_float_eq(max[11], 0.0, 1e-12);

    let info = status.latest_device_info().expect("device info");
    assert_eq!(info.software_version.as_deref(), Some("2026.10.1.mr12345"));
    // Uptime arrives as a string
    assert_eq!(status.uptime_secs(), Some(273_845));
}

#[test]
fn test_parse_speedtest_columns() {
    let snapshot = TelemetrySnapshot::from_json(&load_fixture("poll_columns.json")).unwrap();
    let history = snapshot.speedtests().expect("speedtests");

    assert_eq!(history.len(), 2);
    let latest = history.latest().unwrap();
    assert_float_eq(latest.download_mbps(), 164.5, 1e-9);
    assert_float_eq(latest.upload_mbps(), 11.8, 1e-9);
    assert_eq!(latest.server.sponsor, "Optus");
    assert_eq!(latest.client.isp, "Starlink");
}

#[test]
fn test_parse_record_payload() {
    let snapshot = TelemetrySnapshot::from_json(&load_fixture("records_history.json")).unwrap();

    let (revision, day) = snapshot.series(Revision::Live).expect("some block");
    assert_eq!(revision, Revision::Day);

    // The record without a timestamp is dropped
    assert_eq!(day.len(), 3);
    assert_eq!(day.timestamp[0], 1_792_396_800.0);
    assert_eq!(day.timestamp[1], 1_792_396_801.0);
    assert_eq!(day.timestamp[2], 1_792_396_802.0);
    assert!(day.pop_ping_latency_ms[2].is_nan());
    assert_eq!(day.scheduled, vec![Some(true), None, Some(false)]);

    let history = snapshot.speedtests().expect("speedtests");
    assert_eq!(history.len(), 1);
    assert_eq!(history.results[0].timestamp, 1_792_395_000.0);
    assert_eq!(history.results[0].server.name, "Sydney");
}

#[test]
fn test_ragged_columns_rejected() {
    let err = TelemetrySnapshot::from_json(&load_fixture("ragged_columns.json")).unwrap_err();

    let message = err.to_string();
    assert!(message.contains("starlink"), "{}", message);
    assert!(message.contains("popPingLatencyMs"), "{}", message);
    assert!(matches!(
        err,
        DashError::WithContext { ref source, .. } if matches!(**source, DashError::Payload(_))
    ));
}

#[test]
fn test_invalid_json_is_parse_error() {
    let err = TelemetrySnapshot::from_json("{\"starlink\": ").unwrap_err();
    assert!(matches!(err, DashError::Parse(_)));
}

#[test]
fn test_empty_payload() {
    let snapshot = TelemetrySnapshot::from_json("{}").unwrap();
    assert!(snapshot.is_empty());
    assert!(snapshot.series(Revision::Live).is_none());
    assert!(snapshot.speedtests().is_none());
}
