use super::{edit_typed_settings, Widget, WidgetAction, WidgetSettingsUiResult};
use crate::dashboard::dashboard::DashboardContext;
use eframe::egui;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherConfig {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

pub struct WeatherWidget {
    cfg: WeatherConfig,
}

impl WeatherWidget {
    pub fn new(cfg: WeatherConfig) -> Self {
        Self { cfg }
    }

    pub fn settings_ui(ui: &mut egui::Ui, value: &mut serde_json::Value) -> WidgetSettingsUiResult {
        edit_typed_settings(ui, value, |ui, cfg: &mut WeatherConfig| {
            let mut changed = false;
            let mut location = cfg.location.clone().unwrap_or_default();
            ui.horizontal(|ui| {
                ui.label("Location");
                changed |= ui.text_edit_singleline(&mut location).changed();
            });
            if changed {
                let trimmed = location.trim();
                cfg.location = (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
            changed
        })
    }

    fn location(&self) -> &str {
        self.cfg
            .location
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or("your city")
    }

    pub fn target_url(&self) -> String {
        self.cfg.url.clone().unwrap_or_else(|| {
            format!(
                "https://www.google.com/search?q={}",
                urlencoding::encode(&format!("weather {}", self.location()))
            )
        })
    }
}

impl Widget for WeatherWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) -> Option<WidgetAction> {
        let clicked = ui.button(format!("⛅ {}", self.location())).clicked();
        ui.weak("Opens the forecast in your browser.");
        clicked.then(|| WidgetAction::OpenUrl(self.target_url()))
    }

    fn on_settings_updated(&mut self, settings: &serde_json::Value) {
        if let Ok(cfg) = serde_json::from_value::<WeatherConfig>(settings.clone()) {
            self.cfg = cfg;
        }
    }
}
