use crate::dashboard::dashboard::DashboardContext;
use eframe::egui;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod calculator;
mod calendar;
mod clock;
mod favorites;
mod news;
mod notes;
mod placeholder;
mod search;
mod todo;
mod weather;

pub use calculator::{Calculator, CalculatorKey, CalculatorWidget};
pub use calendar::{month_grid, CalendarWidget, WeekStart};
pub use clock::ClockWidget;
pub use favorites::FavoritesWidget;
pub use news::{NewsConfig, NewsLink, NewsWidget};
pub use notes::NotesWidget;
pub use placeholder::PlaceholderWidget;
pub use search::{build_search_url, SearchConfig, SearchSettings, SearchWidget};
pub use todo::{TodoItem, TodoList, TodoWidget};
pub use weather::WeatherWidget;

/// Something a widget asks the application to do on its behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetAction {
    OpenUrl(String),
}

/// Result of editing widget settings.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct WidgetSettingsUiResult {
    pub changed: bool,
    pub error: Option<String>,
}

/// Handler used to render widget settings.
pub type SettingsUiFn = fn(&mut egui::Ui, &mut Value) -> WidgetSettingsUiResult;

/// Content renderer implemented by every widget type. Instances own the
/// widget's private state (to-do items, calculator register, ...).
pub trait Widget: Send {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &DashboardContext<'_>) -> Option<WidgetAction>;

    fn on_settings_updated(&mut self, _settings: &Value) {}
}

/// Registry entry describing one widget type.
#[derive(Clone)]
pub struct WidgetDescriptor {
    pub name: String,
    pub icon: String,
    pub default_width: u32,
    pub default_height: u32,
    ctor: Arc<dyn Fn(&Value) -> Box<dyn Widget> + Send + Sync>,
    default_settings: Arc<dyn Fn() -> Value + Send + Sync>,
    settings_ui: Option<SettingsUiFn>,
}

impl WidgetDescriptor {
    pub fn new<T: Widget + 'static, C: DeserializeOwned + Serialize + Default + 'static>(
        name: &str,
        icon: &str,
        size: (u32, u32),
        build: fn(C) -> T,
    ) -> Self {
        Self {
            name: name.to_string(),
            icon: icon.to_string(),
            default_width: size.0.max(1),
            default_height: size.1.max(1),
            ctor: Arc::new(move |v: &Value| {
                let cfg = match serde_json::from_value::<C>(v.clone()) {
                    Ok(cfg) => cfg,
                    Err(e) => {
                        tracing::debug!("widget settings rejected, using defaults: {e}");
                        C::default()
                    }
                };
                Box::new(build(cfg)) as Box<dyn Widget>
            }),
            default_settings: Arc::new(|| {
                serde_json::to_value(C::default()).unwrap_or_else(|_| json!({}))
            }),
            settings_ui: None,
        }
    }

    pub fn with_settings_ui(mut self, settings_ui: SettingsUiFn) -> Self {
        self.settings_ui = Some(settings_ui);
        self
    }

    pub fn default_size(&self) -> (u32, u32) {
        (self.default_width, self.default_height)
    }

    pub fn default_settings(&self) -> Value {
        (self.default_settings)()
    }

    pub fn settings_ui(&self) -> Option<SettingsUiFn> {
        self.settings_ui
    }

    pub fn create(&self, settings: &Value) -> Box<dyn Widget> {
        if settings.is_null() {
            (self.ctor)(&self.default_settings())
        } else {
            (self.ctor)(settings)
        }
    }
}

/// Stand-in used for widget types that are no longer (or not yet) registered.
pub fn placeholder_descriptor() -> WidgetDescriptor {
    WidgetDescriptor::new("Unknown widget", "?", (1, 1), PlaceholderWidget::new)
}

#[derive(Clone)]
pub struct WidgetRegistry {
    map: HashMap<String, WidgetDescriptor>,
    placeholder: WidgetDescriptor,
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            placeholder: placeholder_descriptor(),
        }
    }
}

impl WidgetRegistry {
    pub fn with_defaults() -> Self {
        let mut reg = Self::default();
        reg.register(
            "clock",
            WidgetDescriptor::new("Clock", "🕒", (2, 1), ClockWidget::new)
                .with_settings_ui(ClockWidget::settings_ui),
        );
        reg.register(
            "weather",
            WidgetDescriptor::new("Weather", "⛅", (1, 1), WeatherWidget::new)
                .with_settings_ui(WeatherWidget::settings_ui),
        );
        reg.register(
            "calendar",
            WidgetDescriptor::new("Calendar", "📅", (2, 2), CalendarWidget::new),
        );
        reg.register(
            "todo",
            WidgetDescriptor::new("To-do", "☑", (1, 2), TodoWidget::new),
        );
        reg.register(
            "favorites",
            WidgetDescriptor::new("Favorites", "★", (2, 1), FavoritesWidget::new),
        );
        reg.register(
            "calculator",
            WidgetDescriptor::new("Calculator", "🖩", (1, 2), CalculatorWidget::new),
        );
        reg.register(
            "notes",
            WidgetDescriptor::new("Notes", "📝", (2, 1), NotesWidget::new),
        );
        reg.register(
            "news",
            WidgetDescriptor::new("News", "📰", (2, 1), NewsWidget::new)
                .with_settings_ui(NewsWidget::settings_ui),
        );
        reg.register(
            "search_google",
            WidgetDescriptor::new("Google Search", "🔍", (2, 1), SearchWidget::google)
                .with_settings_ui(SearchWidget::settings_ui),
        );
        reg.register(
            "search_bing",
            WidgetDescriptor::new("Bing Search", "🔎", (2, 1), SearchWidget::bing)
                .with_settings_ui(SearchWidget::settings_ui),
        );
        reg
    }

    pub fn register(&mut self, kind: &str, descriptor: WidgetDescriptor) {
        self.map.insert(kind.to_string(), descriptor);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.map.contains_key(kind)
    }

    pub fn descriptor(&self, kind: &str) -> Option<&WidgetDescriptor> {
        self.map.get(kind)
    }

    /// Lookup that never fails: retired types resolve to the placeholder.
    pub fn descriptor_or_placeholder(&self, kind: &str) -> &WidgetDescriptor {
        self.map.get(kind).unwrap_or(&self.placeholder)
    }

    pub fn create(&self, kind: &str, settings: &Value) -> Box<dyn Widget> {
        match self.map.get(kind) {
            Some(descriptor) => descriptor.create(settings),
            None => {
                tracing::warn!(widget = %kind, "unknown widget type rendered as placeholder");
                Box::new(PlaceholderWidget::missing(kind))
            }
        }
    }

    /// Registered types sorted by display name, for the widget picker.
    pub fn entries(&self) -> Vec<(&str, &WidgetDescriptor)> {
        let mut entries: Vec<(&str, &WidgetDescriptor)> = self
            .map
            .iter()
            .map(|(kind, d)| (kind.as_str(), d))
            .collect();
        entries.sort_by(|a, b| a.1.name.cmp(&b.1.name).then_with(|| a.0.cmp(b.0)));
        entries
    }

    pub fn default_settings(&self, kind: &str) -> Option<Value> {
        self.map.get(kind).map(|d| d.default_settings())
    }

    pub fn render_settings_ui(
        &self,
        kind: &str,
        ui: &mut egui::Ui,
        settings: &mut Value,
    ) -> Option<WidgetSettingsUiResult> {
        let descriptor = self.map.get(kind)?;
        let render = descriptor.settings_ui()?;
        if settings.is_null() {
            *settings = descriptor.default_settings();
        }
        Some(render(ui, settings))
    }
}

pub(crate) fn merge_json(base: &Value, updates: &Value) -> Value {
    match (base, updates) {
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = a.clone();
            for (k, v) in b {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        _ => updates.clone(),
    }
}

pub(crate) fn edit_typed_settings<C: DeserializeOwned + Serialize + Default>(
    ui: &mut egui::Ui,
    value: &mut Value,
    render: impl FnOnce(&mut egui::Ui, &mut C) -> bool,
) -> WidgetSettingsUiResult {
    let mut changed = false;
    let mut error = None;
    if value.is_null() {
        *value = serde_json::to_value(C::default()).unwrap_or_else(|_| json!({}));
        changed = true;
    }

    let original = value.clone();
    let mut cfg: C = match serde_json::from_value(original.clone()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error = Some(format!("Failed to parse settings: {e}"));
            C::default()
        }
    };

    let ui_changed = render(ui, &mut cfg);
    let serialized = serde_json::to_value(&cfg).unwrap_or_else(|_| json!({}));

    // Unknown fields survive an edit.
    let merged = merge_json(&original, &serialized);
    if merged != *value {
        *value = merged;
        changed = true;
    }
    changed |= ui_changed && *value != original;

    WidgetSettingsUiResult { changed, error }
}

#[derive(Debug, Clone)]
pub struct TimedCache<T> {
    pub data: T,
    pub interval: Duration,
    last_refresh: Option<Instant>,
}

impl<T> TimedCache<T> {
    pub fn new(data: T, interval: Duration) -> Self {
        Self {
            data,
            interval,
            last_refresh: None,
        }
    }

    pub fn should_refresh(&self) -> bool {
        self.last_refresh
            .map_or(true, |at| at.elapsed() >= self.interval)
    }

    pub fn refresh(&mut self, update: impl FnOnce(&mut T)) {
        update(&mut self.data);
        self.last_refresh = Some(Instant::now());
    }

    pub fn invalidate(&mut self) {
        self.last_refresh = None;
    }
}
