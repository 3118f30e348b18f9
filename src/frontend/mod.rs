//! Frontend module for egui UI
//!
//! This module provides the dashboard window using eframe/egui. It receives
//! snapshots from the backend through crossbeam channels and renders them.
//!
//! # Architecture
//!
//! Every frame the app drains the backend messages. Each snapshot is applied
//! atomically: [`ChartBuilder`] rebuilds every chart model from it in one
//! step and the new [`Dashboard`] replaces the old one. When a fetch fails
//! the last good dashboard stays on screen and the error goes to the status
//! bar.
//!
//! # Submodules
//!
//! - `plot` - Chart rendering with egui_plot
//! - `toolbar` - History selector, refresh controls, speed-test trigger
//! - `status_bar` - Connection state, refresh statistics, errors

mod plot;
mod status_bar;
mod toolbar;

pub use plot::{format_time_label, render_chart};
pub use status_bar::{render_status_bar, StatusBarContext};
pub use toolbar::{render_toolbar, ToolbarAction, ToolbarContext};

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::backend::{BackendMessage, FrontendReceiver};
use crate::charts::{ChartBuilder, Dashboard};
use crate::config::settings::{HistoryRange, RuntimeSettings};
use crate::config::{AppConfig, AppState};
use crate::error::Result;
use crate::telemetry::{Revision, TelemetrySnapshot};
use crate::types::{ConnectionStatus, RefreshStats};

/// Windows narrower than this get larger text
pub const NARROW_WIDTH: f32 = 1000.0;

/// Extra text scale applied to narrow windows
pub const NARROW_FONT_SCALE: f32 = 1.25;

/// How long "Speedtest initiated" stays visible
const SPEEDTEST_NOTICE: Duration = Duration::from_secs(5);

/// Chart height in points
const CHART_HEIGHT: f32 = 220.0;

/// Main application state for the dashboard
pub struct DashboardApp {
    // === Communication ===
    frontend: FrontendReceiver,

    // === Configuration ===
    config: AppConfig,
    /// Where `config` is saved when toggled from the UI
    config_path: Option<PathBuf>,
    app_state: AppState,
    settings: RuntimeSettings,

    // === Render state ===
    builder: ChartBuilder,
    dashboard: Dashboard,
    snapshot: Option<Box<TelemetrySnapshot>>,
    connection_status: ConnectionStatus,
    stats: RefreshStats,
    last_error: Option<String>,
    last_updated: Option<DateTime<Local>>,
    speedtest_notice_until: Option<Instant>,
    source_label: String,

    /// Text scale currently applied to the egui style
    applied_text_scale: f32,
}

impl DashboardApp {
    /// Create a new application instance
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        frontend: FrontendReceiver,
        config: AppConfig,
        config_path: Option<PathBuf>,
        app_state: AppState,
    ) -> Self {
        apply_theme(&cc.egui_ctx, app_state.ui_preferences.dark_mode);
        let mut app = Self::with_parts(frontend, config, config_path, app_state);
        app.update_text_scale(&cc.egui_ctx);
        app
    }

    /// Create the app state without a window
    pub fn with_parts(
        frontend: FrontendReceiver,
        config: AppConfig,
        config_path: Option<PathBuf>,
        app_state: AppState,
    ) -> Self {
        let history_secs = app_state
            .last_history_secs
            .unwrap_or(config.collection.history_secs);
        let settings = RuntimeSettings::new(history_secs);
        let builder = ChartBuilder::new(config.chart_settings(settings.history.secs()));

        // The worker starts with the config's history; catch it up with the saved one
        if settings.history.secs() != config.collection.history_secs {
            if let Err(e) = frontend.set_history_secs(settings.history.secs()) {
                tracing::warn!("Failed to restore history length: {}", e);
            }
        }

        let source_label = match config.server.mode {
            crate::config::SourceMode::Poll => format!("poll {}", config.server.data_url()),
            crate::config::SourceMode::Push => format!("push {}", config.server.push_addr),
            crate::config::SourceMode::Mock => "mock data".to_string(),
        };

        Self {
            frontend,
            config,
            config_path,
            app_state,
            settings,
            builder,
            dashboard: Dashboard::default(),
            snapshot: None,
            connection_status: ConnectionStatus::Disconnected,
            stats: RefreshStats::default(),
            last_error: None,
            last_updated: None,
            speedtest_notice_until: None,
            source_label,
            applied_text_scale: 1.0,
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection_status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// "Updated: 3:04PM" once a snapshot has been applied
    pub fn updated_label(&self) -> Option<String> {
        self.last_updated
            .map(|t| format!("Updated: {}", t.format("%-I:%M%p")))
    }

    /// Process all pending backend messages, returning whether any arrived
    pub fn process_backend_messages(&mut self) -> bool {
        let messages = self.frontend.drain();
        let had_messages = !messages.is_empty();
        for msg in messages {
            self.handle_message(msg);
        }
        had_messages
    }

    fn handle_message(&mut self, msg: BackendMessage) {
        match msg {
            BackendMessage::Snapshot(snapshot) => self.apply_snapshot(snapshot),
            BackendMessage::ConnectionStatus(status) => {
                self.connection_status = status;
            }
            BackendMessage::FetchError(error) => {
                tracing::debug!("Backend reported: {}", error);
                self.last_error = Some(error);
            }
            BackendMessage::SpeedtestTriggered => {
                self.speedtest_notice_until = Some(Instant::now() + SPEEDTEST_NOTICE);
            }
            BackendMessage::Stats(stats) => {
                self.stats = stats;
            }
            BackendMessage::Shutdown => {
                self.connection_status = ConnectionStatus::Disconnected;
            }
        }
    }

    /// Rebuild every chart from a snapshot and swap the dashboard in one step
    pub fn apply_snapshot(&mut self, snapshot: Box<TelemetrySnapshot>) {
        let preferred = Revision::for_history_secs(self.settings.history.secs());
        self.dashboard = self.builder.build(&snapshot, preferred);
        self.snapshot = Some(snapshot);
        self.last_error = None;
        self.last_updated = Some(Local::now());
    }

    /// Apply a toolbar action
    pub fn handle_action(&mut self, action: ToolbarAction) {
        let sent = match action {
            ToolbarAction::SetHistory(range) => self.set_history(range),
            ToolbarAction::RefreshNow => self.frontend.refresh_now(),
            ToolbarAction::TogglePause => {
                if self.settings.toggle_pause() {
                    self.frontend.pause()
                } else {
                    self.frontend.resume()
                }
            }
            ToolbarAction::TriggerSpeedtest => {
                if self.config.collection.speedtest_enabled {
                    self.frontend.trigger_speedtest()
                } else {
                    Ok(())
                }
            }
            ToolbarAction::ToggleSpeedtestEnabled => {
                self.toggle_speedtest();
                Ok(())
            }
            ToolbarAction::ToggleDarkMode => {
                self.app_state.ui_preferences.dark_mode = !self.app_state.ui_preferences.dark_mode;
                self.save_app_state();
                Ok(())
            }
        };

        if let Err(e) = sent {
            tracing::warn!("{:?} not delivered: {}", action, e);
            self.last_error = Some(e.to_string());
        }
    }

    fn set_history(&mut self, range: HistoryRange) -> Result<()> {
        if !self.settings.set_history(range) {
            return Ok(());
        }
        tracing::info!("History range set to {}", range);
        self.builder.set_history_records(range.records());
        let sent = self.frontend.set_history_secs(range.secs());

        // Redraw what we already have; the backend follows up with a full snapshot
        if let Some(snapshot) = self.snapshot.take() {
            self.apply_snapshot(snapshot);
        }

        self.app_state.last_history_secs = Some(range.secs());
        self.save_app_state();
        sent
    }

    fn toggle_speedtest(&mut self) {
        let result = match &self.config_path {
            Some(path) => self.config.toggle_speedtest(path),
            None => {
                self.config.collection.speedtest_enabled = !self.config.collection.speedtest_enabled;
                Ok(self.config.collection.speedtest_enabled)
            }
        };
        match result {
            Ok(enabled) => tracing::info!("Speed tests {}", if enabled { "enabled" } else { "disabled" }),
            Err(e) => {
                tracing::warn!("Failed to save config: {}", e);
                self.last_error = Some(format!("Failed to save config: {}", e));
            }
        }
    }

    fn save_app_state(&self) {
        if let Err(e) = self.app_state.save() {
            tracing::warn!("Failed to save app state: {}", e);
        }
    }

    fn speedtest_notice_visible(&self) -> bool {
        self.speedtest_notice_until
            .is_some_and(|until| Instant::now() < until)
    }

    /// Scale text up for narrow windows
    fn update_text_scale(&mut self, ctx: &egui::Context) {
        let width = ctx.screen_rect().width();
        let narrow = if width > 0.0 && width < NARROW_WIDTH {
            NARROW_FONT_SCALE
        } else {
            1.0
        };
        let scale = narrow * self.app_state.ui_preferences.font_scale;
        if (scale - self.applied_text_scale).abs() < f32::EPSILON {
            return;
        }

        let base = egui::Style::default();
        let mut style = (*ctx.style()).clone();
        for (text_style, font_id) in style.text_styles.iter_mut() {
            if let Some(base_font) = base.text_styles.get(text_style) {
                font_id.size = base_font.size * scale;
            }
        }
        ctx.set_style(style);
        apply_theme(ctx, self.app_state.ui_preferences.dark_mode);
        self.applied_text_scale = scale;
    }

    fn render_charts(&self, ui: &mut egui::Ui) {
        if self.dashboard.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.heading(crate::charts::WAITING_TEXT);
            });
            return;
        }

        let columns = if ui.available_width() >= NARROW_WIDTH { 2 } else { 1 };
        egui::ScrollArea::vertical().show(ui, |ui| {
            if columns == 1 {
                for chart in &self.dashboard.charts {
                    render_chart(ui, chart, CHART_HEIGHT);
                    ui.add_space(8.0);
                }
                return;
            }
            for pair in self.dashboard.charts.chunks(2) {
                ui.columns(2, |cols| {
                    for (col, chart) in cols.iter_mut().zip(pair) {
                        render_chart(col, chart, CHART_HEIGHT);
                    }
                });
                ui.add_space(8.0);
            }
        });
    }
}

fn apply_theme(ctx: &egui::Context, dark_mode: bool) {
    if dark_mode {
        ctx.set_visuals(egui::Visuals::dark());
    } else {
        ctx.set_visuals(egui::Visuals::light());
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.process_backend_messages() {
            ctx.request_repaint();
        }
        // Keep draining while idle so snapshots show up without input events
        ctx.request_repaint_after(Duration::from_millis(200));

        self.update_text_scale(ctx);

        let updated = self.updated_label();
        let toolbar_ctx = ToolbarContext {
            config: &self.config,
            settings: &self.settings,
            dark_mode: self.app_state.ui_preferences.dark_mode,
            updated_label: updated.as_deref(),
            speedtest_notice: self.speedtest_notice_visible(),
        };
        let actions = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| render_toolbar(ui, &toolbar_ctx))
            .inner;
        let theme_changed = actions.contains(&ToolbarAction::ToggleDarkMode);
        for action in actions {
            self.handle_action(action);
        }
        if theme_changed {
            apply_theme(ctx, self.app_state.ui_preferences.dark_mode);
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            let status_ctx = StatusBarContext {
                connection_status: self.connection_status,
                stats: &self.stats,
                source: &self.source_label,
                dish: self.snapshot.as_ref().and_then(|s| s.status.as_ref()),
                last_error: self.last_error.as_deref(),
            };
            render_status_bar(ui, &status_ctx);
        });

        egui::CentralPanel::default().show(ctx, |ui| self.render_charts(ui));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // The worker may already be gone
        let _ = self.frontend.shutdown();
        self.save_app_state();
    }
}
