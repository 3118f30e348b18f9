//! Status bar panel: bottom bar showing connection, refresh stats, and error info.

use egui::{Color32, RichText, Ui};

use crate::telemetry::{format_uptime, DishStatus};
use crate::types::{ConnectionStatus, RefreshStats};

/// Context needed to render the status bar.
pub struct StatusBarContext<'a> {
    pub connection_status: ConnectionStatus,
    pub stats: &'a RefreshStats,
    /// Where snapshots come from, e.g. "poll http://localhost/api/data"
    pub source: &'a str,
    pub dish: Option<&'a DishStatus>,
    pub last_error: Option<&'a str>,
}

pub fn status_color(status: ConnectionStatus) -> Color32 {
    match status {
        ConnectionStatus::Connected => Color32::GREEN,
        ConnectionStatus::Connecting => Color32::YELLOW,
        ConnectionStatus::Paused => Color32::LIGHT_BLUE,
        ConnectionStatus::Disconnected => Color32::GRAY,
        ConnectionStatus::Error => Color32::RED,
    }
}

/// Failure count, with the success rate once anything has failed
pub fn error_summary(stats: &RefreshStats) -> String {
    if stats.failed_fetches == 0 {
        "Errors: 0".to_string()
    } else {
        format!("Errors: {} ({:.0}% ok)", stats.failed_fetches, stats.success_rate())
    }
}

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, ctx: &StatusBarContext<'_>) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        // === Connection status dot + source ===
        ui.colored_label(status_color(ctx.connection_status), "●");
        ui.label(RichText::new(format!("{}: {}", ctx.connection_status, ctx.source)).small());

        ui.separator();

        let stats = ctx.stats;

        // === Fetch counts ===
        ui.label(RichText::new(format!("Fetches: {}", stats.successful_fetches)).small());
        if stats.pushed_snapshots > 0 {
            ui.label(RichText::new(format!("Pushed: {}", stats.pushed_snapshots)).small());
        }

        let error_color = if stats.failed_fetches > 0 {
            Color32::LIGHT_RED
        } else {
            Color32::GRAY
        };
        ui.colored_label(error_color, RichText::new(error_summary(stats)).small());

        ui.separator();

        // === Latency ===
        if let Some(latency) = stats.last_fetch_latency {
            ui.label(
                RichText::new(format!(
                    "Latency: {} ms (avg {:.0} ms)",
                    latency.as_millis(),
                    stats.avg_fetch_latency_ms
                ))
                .small(),
            );
            ui.separator();
        }

        if stats.dropped_messages > 0 {
            ui.colored_label(
                Color32::YELLOW,
                RichText::new(format!("Dropped: {}", stats.dropped_messages)).small(),
            );
            ui.separator();
        }

        // === Terminal identity ===
        if let Some(dish) = ctx.dish {
            if let Some(version) = dish
                .latest_device_info()
                .and_then(|info| info.software_version.as_deref())
            {
                ui.label(RichText::new(format!("Firmware: {}", version)).small());
            }
            if let Some(uptime) = dish.uptime_secs() {
                ui.label(RichText::new(format!("Uptime: {}", format_uptime(uptime))).small());
            }
        }

        // === Error message (right-aligned) ===
        if let Some(error) = ctx.last_error {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.colored_label(Color32::RED, RichText::new(error).small());
            });
        }
    });
}
