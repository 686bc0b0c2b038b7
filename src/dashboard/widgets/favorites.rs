use super::{Widget, WidgetAction};
use crate::dashboard::dashboard::DashboardContext;
use eframe::egui;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FavoritesConfig {
    #[serde(default)]
    pub show_category: bool,
}

/// Read-only view over the aggregated favorite markers.
pub struct FavoritesWidget {
    cfg: FavoritesConfig,
}

impl FavoritesWidget {
    pub fn new(cfg: FavoritesConfig) -> Self {
        Self { cfg }
    }
}

impl Widget for FavoritesWidget {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &DashboardContext<'_>) -> Option<WidgetAction> {
        if ctx.favorites.is_empty() {
            ui.weak("Star a site in any category to see it here.");
            return None;
        }
        let mut action = None;
        ui.horizontal_wrapped(|ui| {
            for fav in ctx.favorites {
                let text = if self.cfg.show_category {
                    format!("★ {} · {}", fav.label(), fav.category)
                } else {
                    format!("★ {}", fav.label())
                };
                match fav.url() {
                    Some(url) => {
                        if ui.button(text).on_hover_text(url.as_str()).clicked() {
                            action = Some(WidgetAction::OpenUrl(url.to_string()));
                        }
                    }
                    None => {
                        ui.label(text);
                    }
                }
            }
        });
        action
    }
}
