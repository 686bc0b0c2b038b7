use super::{edit_typed_settings, Widget, WidgetAction, WidgetSettingsUiResult};
use crate::dashboard::dashboard::DashboardContext;
use eframe::egui;
use serde::{Deserialize, Serialize};

const QUERY_PLACEHOLDER: &str = "{query}";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    pub engine: String,
    /// URL template; `{query}` is replaced by the percent-encoded query.
    pub url_template: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::google()
    }
}

impl SearchConfig {
    pub fn google() -> Self {
        Self {
            engine: "Google".into(),
            url_template: "https://www.google.com/search?q={query}".into(),
        }
    }

    pub fn bing() -> Self {
        Self {
            engine: "Bing".into(),
            url_template: "https://www.bing.com/search?q={query}".into(),
        }
    }
}

/// Builds the search URL, or `None` for a blank query.
pub fn build_search_url(template: &str, query: &str) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    let encoded = urlencoding::encode(query);
    if template.contains(QUERY_PLACEHOLDER) {
        Some(template.replace(QUERY_PLACEHOLDER, &encoded))
    } else {
        Some(format!("{template}{encoded}"))
    }
}

/// Per-widget overrides; missing fields come from the engine the widget type
/// was registered with.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchSettings {
    pub engine: Option<String>,
    pub url_template: Option<String>,
}

pub struct SearchWidget {
    base: SearchConfig,
    cfg: SearchConfig,
    query: String,
}

impl SearchWidget {
    fn with_base(base: SearchConfig, overrides: SearchSettings) -> Self {
        Self {
            cfg: Self::apply(&base, overrides),
            base,
            query: String::new(),
        }
    }

    fn apply(base: &SearchConfig, overrides: SearchSettings) -> SearchConfig {
        SearchConfig {
            engine: overrides.engine.unwrap_or_else(|| base.engine.clone()),
            url_template: overrides
                .url_template
                .unwrap_or_else(|| base.url_template.clone()),
        }
    }

    pub fn google(cfg: SearchSettings) -> Self {
        Self::with_base(SearchConfig::google(), cfg)
    }

    pub fn bing(cfg: SearchSettings) -> Self {
        Self::with_base(SearchConfig::bing(), cfg)
    }

    pub fn engine(&self) -> &str {
        &self.cfg.engine
    }

    pub fn settings_ui(ui: &mut egui::Ui, value: &mut serde_json::Value) -> WidgetSettingsUiResult {
        edit_typed_settings(ui, value, |ui, cfg: &mut SearchSettings| {
            let mut changed = false;
            let mut engine = cfg.engine.clone().unwrap_or_default();
            let mut template = cfg.url_template.clone().unwrap_or_default();
            ui.horizontal(|ui| {
                ui.label("Engine name");
                changed |= ui.text_edit_singleline(&mut engine).changed();
            });
            ui.horizontal(|ui| {
                ui.label("URL template");
                changed |= ui.text_edit_singleline(&mut template).changed();
            });
            ui.weak("Use {query} where the search terms go. Leave empty for the default.");
            if changed {
                cfg.engine = (!engine.trim().is_empty()).then(|| engine.trim().to_string());
                cfg.url_template =
                    (!template.trim().is_empty()).then(|| template.trim().to_string());
            }
            changed
        })
    }
}

impl Widget for SearchWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) -> Option<WidgetAction> {
        let mut action = None;
        ui.horizontal(|ui| {
            let resp = ui.add(
                egui::TextEdit::singleline(&mut self.query)
                    .hint_text(format!("Search {}", self.cfg.engine))
                    .desired_width(ui.available_width() - 36.0),
            );
            let submitted = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("🔍").clicked() || submitted {
                if let Some(url) = build_search_url(&self.cfg.url_template, &self.query) {
                    tracing::debug!(engine = %self.cfg.engine, "search submitted");
                    self.query.clear();
                    action = Some(WidgetAction::OpenUrl(url));
                }
            }
        });
        action
    }

    fn on_settings_updated(&mut self, settings: &serde_json::Value) {
        if let Ok(overrides) = serde_json::from_value::<SearchSettings>(settings.clone()) {
            self.cfg = Self::apply(&self.base, overrides);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_encoded_url() {
        assert_eq!(
            build_search_url("https://www.google.com/search?q={query}", " rust & egui "),
            Some("https://www.google.com/search?q=rust%20%26%20egui".into())
        );
    }

    #[test]
    fn template_without_placeholder_appends() {
        assert_eq!(
            build_search_url("https://duckduckgo.com/?q=", "a b"),
            Some("https://duckduckgo.com/?q=a%20b".into())
        );
    }

    #[test]
    fn blank_query_does_nothing() {
        assert_eq!(build_search_url("https://x/?q={query}", "   "), None);
    }

    #[test]
    fn overrides_apply_on_top_of_registered_engine() {
        let cfg: SearchSettings = serde_json::from_value(json!({ "engine": "Work" })).unwrap();
        let w = SearchWidget::bing(cfg);
        assert_eq!(w.engine(), "Work");
        assert!(w.cfg.url_template.starts_with("https://www.bing.com"));
    }
}
