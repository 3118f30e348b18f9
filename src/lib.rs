//! # starlink-dash: Satellite Terminal Telemetry Dashboard
//!
//! A real-time dashboard for satellite internet terminal telemetry. The
//! architecture separates the telemetry backend, which fetches or receives
//! snapshots, from the UI frontend, which turns each snapshot into charts.
//!
//! ## Architecture
//!
//! - **Backend**: A worker thread that polls the HTTP endpoint on a timer or
//!   relays snapshots pushed over a TCP stream
//! - **Charts**: Pure mapping from a [`TelemetrySnapshot`] to chart models
//!   (downsampling, color scales, rolling maxima)
//! - **Frontend**: Renders the chart models using eframe/egui with egui_plot
//! - **Communication**: Crossbeam channels for thread-safe data transfer
//!
//! ## Configuration
//!
//! The config (`config.toml`) and app state (`app_state.json`) are stored in
//! the platform-appropriate data directory under `dev.hxyulin.starlink-dash`:
//!
//! - **Linux**: `~/.local/share/dev.hxyulin.starlink-dash/`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.starlink-dash/`
//! - **Windows**: `%APPDATA%\dev.hxyulin.starlink-dash\`
//!
//! The `STARLINK_DASH_URL` environment variable overrides the server base URL.
//!
//! ## Example
//!
//! ```ignore
//! use starlink_dash::{AppConfig, AppState, DashboardApp, TelemetryBackend};
//!
//! fn main() -> eframe::Result<()> {
//!     let app_state = AppState::load_or_default();
//!     let mut config = AppConfig::load_or_default();
//!     config.apply_env_overrides();
//!
//!     let (backend, frontend_receiver) = TelemetryBackend::new(config.clone());
//!     std::thread::spawn(move || backend.run());
//!
//!     eframe::run_native(
//!         "Starlink Dashboard",
//!         eframe::NativeOptions::default(),
//!         Box::new(|cc| {
//!             Ok(Box::new(DashboardApp::new(
//!                 cc,
//!                 frontend_receiver,
//!                 config,
//!                 None,
//!                 app_state,
//!             )))
//!         }),
//!     )
//! }
//! ```

pub mod app;
pub mod backend;
pub mod charts;
pub mod config;
pub mod downsample;
pub mod error;
pub mod frontend;
pub mod history;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use app::DashboardApp;
pub use backend::{BackendCommand, BackendMessage, TelemetryBackend};
pub use charts::{ChartBuilder, Dashboard};
pub use config::{AppConfig, AppState};
pub use error::{DashError, Result};
pub use telemetry::TelemetrySnapshot;
pub use types::{ConnectionStatus, RefreshStats};
