use super::{edit_typed_settings, Widget, WidgetAction, WidgetSettingsUiResult};
use crate::dashboard::dashboard::DashboardContext;
use chrono::{DateTime, Local};
use eframe::egui;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_true")]
    pub show_seconds: bool,
    #[serde(default = "default_true")]
    pub twenty_four_hour: bool,
    #[serde(default = "default_true")]
    pub show_date: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            show_seconds: true,
            twenty_four_hour: true,
            show_date: true,
        }
    }
}

pub struct ClockWidget {
    cfg: ClockConfig,
}

impl ClockWidget {
    pub fn new(cfg: ClockConfig) -> Self {
        Self { cfg }
    }

    pub fn settings_ui(ui: &mut egui::Ui, value: &mut serde_json::Value) -> WidgetSettingsUiResult {
        edit_typed_settings(ui, value, |ui, cfg: &mut ClockConfig| {
            let mut changed = false;
            changed |= ui.checkbox(&mut cfg.show_seconds, "Show seconds").changed();
            changed |= ui
                .checkbox(&mut cfg.twenty_four_hour, "24-hour clock")
                .changed();
            changed |= ui.checkbox(&mut cfg.show_date, "Show date").changed();
            changed
        })
    }

    fn time_format(&self) -> &'static str {
        match (self.cfg.twenty_four_hour, self.cfg.show_seconds) {
            (true, true) => "%H:%M:%S",
            (true, false) => "%H:%M",
            (false, true) => "%I:%M:%S %p",
            (false, false) => "%I:%M %p",
        }
    }

    pub fn format_time(&self, now: &DateTime<Local>) -> String {
        now.format(self.time_format()).to_string()
    }
}

impl Widget for ClockWidget {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &DashboardContext<'_>) -> Option<WidgetAction> {
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new(self.format_time(&ctx.now)).size(32.0).strong());
            if self.cfg.show_date {
                ui.label(ctx.now.format("%A, %B %-d %Y").to_string());
            }
        });
        ui.ctx()
            .request_repaint_after(std::time::Duration::from_millis(if self.cfg.show_seconds {
                250
            } else {
                1000
            }));
        None
    }

    fn on_settings_updated(&mut self, settings: &serde_json::Value) {
        if let Ok(cfg) = serde_json::from_value::<ClockConfig>(settings.clone()) {
            self.cfg = cfg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_twelve_and_twenty_four_hour() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 15, 4, 5).unwrap();
        let clock = ClockWidget::new(ClockConfig::default());
        assert_eq!(clock.format_time(&now), "15:04:05");
        let clock = ClockWidget::new(ClockConfig {
            show_seconds: false,
            twenty_four_hour: false,
            show_date: false,
        });
        assert_eq!(clock.format_time(&now), "03:04 PM");
    }
}
