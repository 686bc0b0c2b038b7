use super::{Widget, WidgetAction};
use crate::dashboard::dashboard::DashboardContext;
use eframe::egui;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlaceholderConfig {
    #[serde(default)]
    pub kind: Option<String>,
}

/// Rendered for widget types the registry does not know. The widget stays in
/// the layout so nothing the user placed is lost.
pub struct PlaceholderWidget {
    kind: Option<String>,
}

impl PlaceholderWidget {
    pub fn new(cfg: PlaceholderConfig) -> Self {
        Self { kind: cfg.kind }
    }

    pub fn missing(kind: &str) -> Self {
        Self {
            kind: Some(kind.to_string()),
        }
    }
}

impl Widget for PlaceholderWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) -> Option<WidgetAction> {
        match &self.kind {
            Some(kind) => ui.weak(format!("Widget type '{kind}' is not available.")),
            None => ui.weak("This widget is not available."),
        };
        None
    }
}
