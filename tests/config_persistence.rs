//! Integration tests for config and app state persistence

use serial_test::serial;
use starlink_dash::config::{AppConfig, AppState, SourceMode, BASE_URL_ENV};
use starlink_dash::downsample::AggregationMethod;
use starlink_dash::DashError;
use tempfile::TempDir;

#[test]
fn test_config_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = AppConfig::default();
    config.server.base_url = "http://192.168.1.20:8080".to_string();
    config.server.mode = SourceMode::Push;
    config.collection.history_secs = 3_600;
    config.charts.aggregation.snr = AggregationMethod::Median;
    config.logging.log_to_file = true;
    config.save_to(&path).unwrap();

    let loaded = AppConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[collection]"));
    assert!(text.contains("mode = \"push\""));
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[collection]\nspeedtest_enabled = false\n").unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    assert!(!config.collection.speedtest_enabled);
    assert_eq!(config.collection.max_data_points, 200);
    assert_eq!(config.collection.history_secs, 600);
    assert_eq!(config.server, AppConfig::default().server);
}

#[test]
fn test_toggle_speedtest_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = AppConfig::default();
    assert!(!config.toggle_speedtest(&path).unwrap());
    assert!(!AppConfig::load_from(&path).unwrap().collection.speedtest_enabled);

    assert!(config.toggle_speedtest(&path).unwrap());
    assert!(AppConfig::load_from(&path).unwrap().collection.speedtest_enabled);
}

#[test]
fn test_missing_or_broken_file() {
    let dir = TempDir::new().unwrap();

    let missing = AppConfig::load_from(dir.path().join("absent.toml"));
    assert!(matches!(missing, Err(DashError::Config(_))));

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "[collection\nhistory_secs = ").unwrap();
    assert!(matches!(AppConfig::load_from(&broken), Err(DashError::Config(_))));
}

#[test]
#[serial]
fn test_env_override_base_url() {
    std::env::set_var(BASE_URL_ENV, "http://dish.local:5000/");
    let mut config = AppConfig::default();
    config.apply_env_overrides();
    std::env::remove_var(BASE_URL_ENV);

    assert_eq!(config.server.base_url, "http://dish.local:5000");
    assert_eq!(config.server.data_url(), "http://dish.local:5000/api/data");
}

#[test]
#[serial]
fn test_blank_env_is_ignored() {
    std::env::set_var(BASE_URL_ENV, "   ");
    let mut config = AppConfig::default();
    config.apply_env_overrides();
    std::env::remove_var(BASE_URL_ENV);

    assert_eq!(config.server.base_url, AppConfig::default().server.base_url);
}

#[test]
fn test_app_state_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app_state.json");

    let mut state = AppState::default();
    state.last_history_secs = Some(86_400);
    state.ui_preferences.dark_mode = false;
    state.save_to(&path).unwrap();

    let loaded = AppState::load_from(&path).unwrap();
    assert_eq!(loaded.last_history_secs, Some(86_400));
    assert!(!loaded.ui_preferences.dark_mode);
}

#[test]
fn test_app_state_tolerates_missing_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app_state.json");
    std::fs::write(&path, "{}").unwrap();

    let state = AppState::load_from(&path).unwrap();
    assert_eq!(state.last_history_secs, None);
    assert!(state.ui_preferences.dark_mode);
}
