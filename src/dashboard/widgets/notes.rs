use super::{Widget, WidgetAction};
use crate::dashboard::dashboard::DashboardContext;
use eframe::egui;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotesConfig {
    #[serde(default)]
    pub placeholder: Option<String>,
}

/// Free-form scratch text. The text is kept for the session only.
pub struct NotesWidget {
    cfg: NotesConfig,
    text: String,
}

impl NotesWidget {
    pub fn new(cfg: NotesConfig) -> Self {
        Self {
            cfg,
            text: String::new(),
        }
    }
}

impl Widget for NotesWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) -> Option<WidgetAction> {
        let hint = self.cfg.placeholder.as_deref().unwrap_or("Write something…");
        ui.add(
            egui::TextEdit::multiline(&mut self.text)
                .hint_text(hint)
                .desired_width(f32::INFINITY)
                .desired_rows(4),
        );
        None
    }
}
