//! Configuration module for the dashboard
//!
//! This module handles:
//! - Application configuration ([`AppConfig`]) stored as TOML
//! - Persisted UI state ([`AppState`]) stored as JSON
//! - Runtime settings during execution ([`settings`])
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.hxyulin.starlink-dash/`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.starlink-dash/`
//! - **Windows**: `%APPDATA%\dev.hxyulin.starlink-dash\`
//!
//! # Files
//!
//! - `config.toml` - Server, collection, chart and logging settings; written
//!   with defaults on first start
//! - `app_state.json` - Dark mode, font scale and last history selection
//! - `logs/` - Daily rolling log files when file logging is enabled
//!
//! # Environment
//!
//! `STARLINK_DASH_URL` overrides `server.base_url` without touching the file.

pub mod settings;

pub use settings::*;

use crate::charts::{ChartAggregation, ChartSettings};
use crate::error::{DashError, Result};
use crate::history::DEFAULT_ROLLING_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.hxyulin.starlink-dash";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// App state filename
pub const APP_STATE_FILE: &str = "app_state.json";

/// Log directory inside the app data directory
pub const LOG_DIR: &str = "logs";

/// Environment variable overriding the server base URL
pub const BASE_URL_ENV: &str = "STARLINK_DASH_URL";

/// Default telemetry server
pub const DEFAULT_BASE_URL: &str = "http://localhost";

/// Default address of the push stream
pub const DEFAULT_PUSH_ADDR: &str = "127.0.0.1:5001";

/// Default refresh interval in milliseconds
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 3_000;

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Default number of bars per chart
pub const DEFAULT_MAX_DATA_POINTS: usize = 200;

/// Default history length in seconds
pub const DEFAULT_HISTORY_SECS: u64 = 600;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        DashError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            DashError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the config file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

/// Get the path to the app state file
pub fn app_state_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(APP_STATE_FILE))
}

/// Get the directory for log files
pub fn log_dir() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(LOG_DIR))
}

// ==================== App State ====================

/// Persistent UI state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    /// Version for future migration support
    #[serde(default = "default_app_state_version")]
    pub version: u32,

    /// History length last selected, in seconds
    #[serde(default)]
    pub last_history_secs: Option<u64>,

    /// UI preferences
    #[serde(default)]
    pub ui_preferences: UiPreferences,
}

fn default_app_state_version() -> u32 {
    1
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: 1,
            last_history_secs: None,
            ui_preferences: UiPreferences::default(),
        }
    }
}

impl AppState {
    /// Load app state from the default location
    pub fn load() -> Result<Self> {
        let path = app_state_path().ok_or_else(|| {
            DashError::Config("Could not determine app state path".to_string())
        })?;
        Self::load_from(path)
    }

    /// Load app state from a file; a missing file gives defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| DashError::Config(format!("Failed to read app state: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| DashError::Config(format!("Failed to parse app state: {}", e)))
    }

    /// Load app state, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load app state, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save app state to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(APP_STATE_FILE))
    }

    /// Save app state to a file
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| DashError::Config(format!("Failed to serialize app state: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| DashError::Config(format!("Failed to write app state: {}", e)))
    }
}

/// UI preferences that persist across sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiPreferences {
    /// Enable dark mode
    #[serde(default = "default_true")]
    pub dark_mode: bool,

    /// Font scale factor
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
}

fn default_true() -> bool {
    true
}

fn default_font_scale() -> f32 {
    1.0
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            font_scale: 1.0,
        }
    }
}

// ==================== App Config ====================

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where telemetry comes from
    #[serde(default)]
    pub server: ServerConfig,

    /// Refresh cadence and history
    #[serde(default)]
    pub collection: CollectionConfig,

    /// Chart aggregation settings
    #[serde(default)]
    pub charts: ChartsConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config from the default location
    ///
    /// The file is created with defaults when it does not exist yet.
    pub fn load() -> Result<Self> {
        let dir = ensure_app_data_dir()?;
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            let config = Self::default();
            config.save_to(&path)?;
            tracing::info!("Created default config at {:?}", path);
            return Ok(config);
        }
        Self::load_from(path)
    }

    /// Load the config, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load a config file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DashError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            DashError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Save the config to a file as TOML
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DashError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| DashError::Serialization(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            DashError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            tracing::debug!("{} overrides base URL: {}", BASE_URL_ENV, url);
            self.server.base_url = url.trim().trim_end_matches('/').to_string();
        }
    }

    /// Flip the speed-test switch and save the config, returning the new value
    pub fn toggle_speedtest(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        self.collection.speedtest_enabled = !self.collection.speedtest_enabled;
        self.save_to(path)?;
        Ok(self.collection.speedtest_enabled)
    }

    /// Chart builder settings for a history length
    pub fn chart_settings(&self, history_secs: u64) -> ChartSettings {
        ChartSettings {
            history_records: history_secs as usize,
            max_data_points: self.collection.max_data_points.max(1),
            aggregation: self.charts.aggregation,
            rolling_capacity: self.charts.rolling_capacity.max(1),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.collection.refresh_interval_ms.max(100))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.server.timeout_ms.max(1))
    }
}

// ==================== Server Config ====================

/// How snapshots reach the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Poll `GET /api/data` on every refresh
    #[default]
    Poll,
    /// Receive snapshots over the push stream
    Push,
    /// Generated data, no server needed
    Mock,
}

impl std::fmt::Display for SourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceMode::Poll => write!(f, "Poll"),
            SourceMode::Push => write!(f, "Push"),
            SourceMode::Mock => write!(f, "Mock"),
        }
    }
}

impl std::str::FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poll" | "http" => Ok(SourceMode::Poll),
            "push" | "stream" => Ok(SourceMode::Push),
            "mock" => Ok(SourceMode::Mock),
            other => Err(format!("unknown source mode '{}'", other)),
        }
    }
}

/// Telemetry server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the HTTP API, without a trailing slash
    pub base_url: String,

    /// Poll, push or mock
    pub mode: SourceMode,

    /// `host:port` of the push stream
    pub push_addr: String,

    /// Timeout for requests and stream connects in milliseconds
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            mode: SourceMode::Poll,
            push_addr: DEFAULT_PUSH_ADDR.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ServerConfig {
    /// URL of the snapshot endpoint
    pub fn data_url(&self) -> String {
        format!("{}/api/data", self.base_url.trim_end_matches('/'))
    }

    /// URL that starts a speed test
    pub fn trigger_speedtest_url(&self) -> String {
        format!("{}/api/trigger_speedtest", self.base_url.trim_end_matches('/'))
    }
}

// ==================== Collection Config ====================

/// Refresh and history configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Time between the end of one refresh and the start of the next
    pub refresh_interval_ms: u64,

    /// History shown on startup, in seconds
    pub history_secs: u64,

    /// Bars per chart after downsampling
    pub max_data_points: usize,

    /// Whether the speed-test trigger is available
    pub speedtest_enabled: bool,

    /// Buffer size for channel communication
    pub channel_buffer_size: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            history_secs: DEFAULT_HISTORY_SECS,
            max_data_points: DEFAULT_MAX_DATA_POINTS,
            speedtest_enabled: true,
            channel_buffer_size: 64,
        }
    }
}

// ==================== Charts Config ====================

/// Chart configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    /// Refreshes remembered by the y-axis rolling maximum
    pub rolling_capacity: usize,

    /// Aggregation per chart
    pub aggregation: ChartAggregation,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            rolling_capacity: DEFAULT_ROLLING_CAPACITY,
            aggregation: ChartAggregation::default(),
        }
    }
}

// ==================== Logging Config ====================

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write a daily rolling log file to the app data directory
    pub log_to_file: bool,

    /// Filter directive used when `RUST_LOG` is not set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

// ==================== Tests ====================
