use super::{edit_typed_settings, Widget, WidgetAction, WidgetSettingsUiResult};
use crate::dashboard::dashboard::DashboardContext;
use eframe::egui;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsLink {
    pub title: String,
    pub url: String,
}

impl NewsLink {
    fn new(title: &str, url: &str) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

fn default_links() -> Vec<NewsLink> {
    vec![
        NewsLink::new("Reuters", "https://www.reuters.com"),
        NewsLink::new("AP News", "https://apnews.com"),
        NewsLink::new("BBC News", "https://www.bbc.com/news"),
        NewsLink::new("Hacker News", "https://news.ycombinator.com"),
    ]
}

fn default_count() -> usize {
    6
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(default = "default_links")]
    pub links: Vec<NewsLink>,
    #[serde(default = "default_count")]
    pub count: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            links: default_links(),
            count: default_count(),
        }
    }
}

/// Headline shortcuts. Links come from the widget settings; nothing is
/// fetched over the network.
pub struct NewsWidget {
    cfg: NewsConfig,
}

impl NewsWidget {
    pub fn new(cfg: NewsConfig) -> Self {
        Self { cfg }
    }

    pub fn settings_ui(ui: &mut egui::Ui, value: &mut serde_json::Value) -> WidgetSettingsUiResult {
        edit_typed_settings(ui, value, |ui, cfg: &mut NewsConfig| {
            let mut changed = false;
            ui.horizontal(|ui| {
                ui.label("Show");
                changed |= ui
                    .add(egui::DragValue::new(&mut cfg.count).clamp_range(1..=20))
                    .changed();
                ui.label("links");
            });
            let mut remove = None;
            for (idx, link) in cfg.links.iter_mut().enumerate() {
                ui.horizontal(|ui| {
                    changed |= ui.text_edit_singleline(&mut link.title).changed();
                    changed |= ui.text_edit_singleline(&mut link.url).changed();
                    if ui.small_button("✕").clicked() {
                        remove = Some(idx);
                    }
                });
            }
            if let Some(idx) = remove {
                cfg.links.remove(idx);
                changed = true;
            }
            if ui.button("Add link").clicked() {
                cfg.links.push(NewsLink::new("New source", "https://"));
                changed = true;
            }
            changed
        })
    }

    pub fn visible_links(&self) -> impl Iterator<Item = &NewsLink> {
        self.cfg
            .links
            .iter()
            .filter(|l| !l.url.trim().is_empty())
            .take(self.cfg.count)
    }
}

impl Widget for NewsWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) -> Option<WidgetAction> {
        let mut action = None;
        for link in self.visible_links() {
            if ui.link(format!("📰 {}", link.title)).clicked() {
                action = Some(WidgetAction::OpenUrl(link.url.clone()));
            }
        }
        if action.is_none() && self.cfg.links.is_empty() {
            ui.weak("No news sources configured.");
        }
        action
    }

    fn on_settings_updated(&mut self, settings: &serde_json::Value) {
        if let Ok(cfg) = serde_json::from_value::<NewsConfig>(settings.clone()) {
            self.cfg = cfg;
        }
    }
}
