//! Starlink Dashboard - Main Entry Point
//!
//! Real-time charts for satellite internet terminal telemetry.

use std::sync::atomic::Ordering;

use anyhow::Context;
use starlink_dash::{
    backend::TelemetryBackend,
    config::{self, AppConfig, AppState, LoggingConfig},
    frontend::DashboardApp,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,starlink_dash=debug";
const LOG_FILE_NAME: &str = "starlink-dash.log";

/// Set up stderr logging plus an optional daily log file
///
/// The returned guard flushes the file writer when dropped.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(logging.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
    });

    let log_dir = if logging.log_to_file {
        config::log_dir().filter(|dir| std::fs::create_dir_all(dir).is_ok())
    } else {
        None
    };
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

fn main() -> anyhow::Result<()> {
    // Config comes first since it decides where logs go
    let mut config = AppConfig::load_or_default();
    config.apply_env_overrides();

    let _log_guard = init_logging(&config.logging);

    tracing::info!("Starting Starlink Dashboard");
    tracing::info!(
        "Source: {:?} at {} (refresh every {:?})",
        config.server.mode,
        config.server.base_url,
        config.refresh_interval()
    );

    let app_state = AppState::load_or_default();
    let config_path = config::config_path().filter(|path| path.exists());

    // Spawn the backend thread
    let (backend, frontend_receiver) = TelemetryBackend::new(config.clone());
    let running = backend.stop_handle();
    let backend_handle = std::thread::Builder::new()
        .name("telemetry-backend".to_string())
        .spawn(move || backend.run())
        .context("Failed to spawn backend thread")?;

    // Configure eframe options
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([480.0, 400.0])
            .with_title("Starlink Dashboard"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "Starlink Dashboard",
        native_options,
        Box::new(|cc| {
            Ok(Box::new(DashboardApp::new(
                cc,
                frontend_receiver,
                config,
                config_path,
                app_state,
            )))
        }),
    );

    // Signal backend to stop and wait for it
    tracing::info!("Shutting down...");
    running.store(false, Ordering::SeqCst);
    if backend_handle.join().is_err() {
        tracing::error!("Backend thread panicked");
    }

    result.map_err(|e| anyhow::anyhow!("Failed to run the dashboard: {e}"))
}
