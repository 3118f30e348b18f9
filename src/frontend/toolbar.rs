//! Toolbar panel: history selector, refresh controls and the speed-test trigger.
//!
//! Sits at the top of the window above the charts.

use egui::{Color32, RichText, Ui};

use crate::config::settings::{HistoryRange, RuntimeSettings};
use crate::config::AppConfig;

/// Context needed to render the toolbar.
pub struct ToolbarContext<'a> {
    pub config: &'a AppConfig,
    pub settings: &'a RuntimeSettings,
    pub dark_mode: bool,
    /// "Updated: ..." text, once a snapshot has been applied
    pub updated_label: Option<&'a str>,
    /// Whether the "Speedtest initiated" notice is showing
    pub speedtest_notice: bool,
}

/// Something the user asked for from the toolbar
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolbarAction {
    SetHistory(HistoryRange),
    RefreshNow,
    TogglePause,
    TriggerSpeedtest,
    ToggleSpeedtestEnabled,
    ToggleDarkMode,
}

/// Render the toolbar, returning the actions to apply.
pub fn render_toolbar(ui: &mut Ui, ctx: &ToolbarContext<'_>) -> Vec<ToolbarAction> {
    let mut actions = Vec::new();

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 6.0;

        // === History group ===
        ui.label("History:");
        let mut selected = ctx.settings.history;
        egui::ComboBox::from_id_salt("toolbar_history_selector")
            .selected_text(selected.label())
            .width(110.0)
            .show_ui(ui, |ui| {
                for range in HistoryRange::ALL {
                    ui.selectable_value(&mut selected, range, range.label());
                }
            });
        if selected != ctx.settings.history {
            actions.push(ToolbarAction::SetHistory(selected));
        }

        ui.separator();

        // === Refresh group ===
        let pause_text = if ctx.settings.paused { "▶ Resume" } else { "⏸ Pause" };
        if ui
            .button(pause_text)
            .on_hover_text("Stop or restart the scheduled refresh")
            .clicked()
        {
            actions.push(ToolbarAction::TogglePause);
        }
        if ui
            .add_enabled(!ctx.settings.paused, egui::Button::new("⟳ Refresh"))
            .on_hover_text("Fetch a snapshot now")
            .clicked()
        {
            actions.push(ToolbarAction::RefreshNow);
        }

        ui.separator();

        // === Speed-test group ===
        render_speedtest_group(ui, ctx, &mut actions);

        // === Right-aligned info group ===
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let theme = if ctx.dark_mode { "☀" } else { "🌙" };
            if ui.button(theme).on_hover_text("Toggle dark mode").clicked() {
                actions.push(ToolbarAction::ToggleDarkMode);
            }
            if let Some(updated) = ctx.updated_label {
                ui.label(RichText::new(updated).weak());
            }
        });
    });

    actions
}

fn render_speedtest_group(ui: &mut Ui, ctx: &ToolbarContext<'_>, actions: &mut Vec<ToolbarAction>) {
    let enabled = ctx.config.collection.speedtest_enabled;

    let trigger = egui::Button::new("Trigger speed test");
    let hover = if enabled {
        "Ask the server to run a speed test"
    } else {
        "Speed tests are disabled"
    };
    if ui.add_enabled(enabled, trigger).on_hover_text(hover).clicked() {
        actions.push(ToolbarAction::TriggerSpeedtest);
    }

    let mut checked = enabled;
    if ui
        .checkbox(&mut checked, "Speed tests")
        .on_hover_text("Enable or disable the speed-test trigger (saved to the config)")
        .changed()
    {
        actions.push(ToolbarAction::ToggleSpeedtestEnabled);
    }

    if ctx.speedtest_notice {
        ui.colored_label(Color32::from_rgb(100, 200, 100), "Speedtest initiated");
    }
}
