use crate::dashboard::layout::{
    clamp_height, clamp_width, clamp_x, clamp_y, Layout, Widget, DEFAULT_BACKGROUND,
};
use crate::dashboard::storage::{KeyValueStore, StorageError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Current schema version of the persisted layout record.
pub const LAYOUT_VERSION: u32 = 1;

/// Key used when one dashboard exists per installation.
pub const DEFAULT_LAYOUT_KEY: &str = "dashboard";

fn legacy_version() -> u32 {
    0
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

fn default_span() -> i64 {
    1
}

fn is_null(v: &Value) -> bool {
    v.is_null()
}

/// Accepts integers or floats (floored) so hand-edited records still load.
fn lenient_cell<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(i64),
        Float(f64),
    }
    Ok(match Number::deserialize(deserializer)? {
        Number::Int(v) => v,
        Number::Float(v) if v.is_finite() => v.floor() as i64,
        Number::Float(_) => 0,
    })
}

/// One widget as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(deserialize_with = "lenient_cell")]
    pub grid_x: i64,
    #[serde(deserialize_with = "lenient_cell")]
    pub grid_y: i64,
    #[serde(default = "default_span", deserialize_with = "lenient_cell")]
    pub width: i64,
    #[serde(default = "default_span", deserialize_with = "lenient_cell")]
    pub height: i64,
    #[serde(default, skip_serializing_if = "is_null")]
    pub settings: Value,
}

impl From<&Widget> for WidgetRecord {
    fn from(w: &Widget) -> Self {
        Self {
            id: w.id.clone(),
            kind: w.kind.clone(),
            title: w.title.clone(),
            grid_x: w.grid_x as i64,
            grid_y: w.grid_y as i64,
            width: w.width as i64,
            height: w.height as i64,
            settings: w.settings.clone(),
        }
    }
}

impl WidgetRecord {
    /// Convert to a placed widget, clamping anything out of range.
    pub fn into_widget(self) -> Widget {
        Widget {
            grid_x: clamp_x(self.grid_x),
            grid_y: clamp_y(self.grid_y),
            width: clamp_width(self.width),
            height: clamp_height(self.height),
            id: self.id,
            kind: self.kind,
            title: self.title,
            settings: self.settings,
        }
    }
}

/// The persisted layout record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutRecord {
    #[serde(default = "legacy_version")]
    pub version: u32,
    pub widgets: Vec<WidgetRecord>,
    #[serde(default = "default_background")]
    pub background: String,
}

impl From<&Layout> for LayoutRecord {
    fn from(layout: &Layout) -> Self {
        Self {
            version: LAYOUT_VERSION,
            widgets: layout.widgets.iter().map(WidgetRecord::from).collect(),
            background: layout.background.clone(),
        }
    }
}

impl LayoutRecord {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a stored record. Returns warnings for every repair made.
    pub fn parse(content: &str) -> anyhow::Result<(Layout, Vec<String>)> {
        let record: LayoutRecord = serde_json::from_str(content)?;
        if record.version > LAYOUT_VERSION {
            anyhow::bail!(
                "layout version {} is newer than supported version {}",
                record.version,
                LAYOUT_VERSION
            );
        }
        Ok(record.into_layout())
    }

    pub fn into_layout(self) -> (Layout, Vec<String>) {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();
        let mut widgets = Vec::with_capacity(self.widgets.len());
        for record in self.widgets {
            let mut widget = record.into_widget();
            if widget.id.is_empty() {
                widget.id = format!("{}_restored", widget.kind);
            }
            if !seen.insert(widget.id.clone()) {
                let base = widget.id.clone();
                let mut n = 2;
                while seen.contains(&format!("{base}_{n}")) {
                    n += 1;
                }
                widget.id = format!("{base}_{n}");
                warnings.push(format!("duplicate widget id '{base}' renamed to '{}'", widget.id));
                seen.insert(widget.id.clone());
            }
            widgets.push(widget);
        }
        (
            Layout {
                widgets,
                background: self.background,
            },
            warnings,
        )
    }
}

/// Persistence adapter: one layout record under a fixed key.
pub struct LayoutPersistence {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl LayoutPersistence {
    pub fn new(store: impl KeyValueStore + 'static, key: &str) -> Self {
        Self {
            store: Box::new(store),
            key: key.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn save(&self, layout: &Layout) -> Result<(), StorageError> {
        let json = LayoutRecord::from(layout).to_json()?;
        self.store.put(&self.key, &json)
    }

    /// The saved layout, or `None` when nothing usable is stored. Corrupt
    /// records are logged and treated as absent.
    pub fn load(&self) -> Option<Layout> {
        let content = match self.store.get(&self.key) {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, "failed to read saved layout: {e}");
                return None;
            }
        };
        match LayoutRecord::parse(&content) {
            Ok((layout, warnings)) => {
                for w in warnings {
                    tracing::warn!("{w}");
                }
                Some(layout)
            }
            Err(e) => {
                tracing::warn!(key = %self.key, "discarding unreadable layout: {e}");
                None
            }
        }
    }

    pub fn load_or_default(&self) -> Layout {
        self.load().unwrap_or_else(|| {
            tracing::info!(key = %self.key, "no saved layout, using defaults");
            Layout::default_layout()
        })
    }

    pub fn take_failures(&self) -> Vec<StorageError> {
        self.store.take_failures()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::storage::MemoryStore;
    use serde_json::json;

    fn persistence() -> LayoutPersistence {
        LayoutPersistence::new(MemoryStore::new(), DEFAULT_LAYOUT_KEY)
    }

    #[test]
    fn serializes_logical_field_names() {
        let layout = Layout::default_layout();
        let value = serde_json::to_value(LayoutRecord::from(&layout)).unwrap();
        assert_eq!(value["version"], json!(LAYOUT_VERSION));
        let first = &value["widgets"][0];
        assert_eq!(first["type"], json!("clock"));
        assert_eq!(first["gridX"], json!(0));
        assert_eq!(first["gridY"], json!(0));
        assert!(first.get("settings").is_none());
        assert_eq!(value["background"], json!("default"));
    }

    #[test]
    fn round_trip_preserves_layout() {
        let p = persistence();
        let mut layout = Layout::default_layout();
        layout.background = "ocean".into();
        layout.widgets[2].settings = json!({ "engine": "Work" });
        p.save(&layout).unwrap();
        assert_eq!(p.load(), Some(layout));
    }

    #[test]
    fn missing_record_is_absent() {
        let p = persistence();
        assert_eq!(p.load(), None);
        assert_eq!(p.load_or_default(), Layout::default_layout());
    }

    #[test]
    fn legacy_record_without_version_loads() {
        let content = r#"{
            "widgets": [
                {"id": "clock_1", "type": "clock", "title": "Clock",
                 "gridX": 1, "gridY": 2, "width": 2, "height": 1}
            ],
            "background": "night"
        }"#;
        let (layout, warnings) = LayoutRecord::parse(content).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(layout.widgets[0].grid_x, 1);
        assert_eq!(layout.background, "night");
    }

    #[test]
    fn out_of_range_and_fractional_coordinates_are_clamped() {
        let content = r#"{
            "version": 1,
            "widgets": [
                {"id": "a", "type": "notes", "gridX": 17, "gridY": -4,
                 "width": 0, "height": -2},
                {"id": "b", "type": "notes", "gridX": 2.7, "gridY": 3.2,
                 "width": 9, "height": 2}
            ]
        }"#;
        let (layout, _) = LayoutRecord::parse(content).unwrap();
        let a = &layout.widgets[0];
        assert_eq!((a.grid_x, a.grid_y, a.width, a.height), (5, 0, 1, 1));
        let b = &layout.widgets[1];
        assert_eq!((b.grid_x, b.grid_y, b.width, b.height), (2, 3, 6, 2));
        assert_eq!(layout.background, DEFAULT_BACKGROUND);
    }

    #[test]
    fn duplicate_ids_are_renamed() {
        let content = r#"{"version": 1, "widgets": [
            {"id": "x", "type": "clock", "gridX": 0, "gridY": 0},
            {"id": "x", "type": "notes", "gridX": 1, "gridY": 0},
            {"id": "x_2", "type": "news", "gridX": 2, "gridY": 0}
        ]}"#;
        let (layout, warnings) = LayoutRecord::parse(content).unwrap();
        let ids: Vec<&str> = layout.widgets.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "x_2", "x_2_2"]);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn newer_version_is_rejected() {
        let content = r#"{"version": 99, "widgets": []}"#;
        assert!(LayoutRecord::parse(content).is_err());
    }

    #[test]
    fn corrupt_record_falls_back_to_defaults() {
        let store = MemoryStore::new();
        store.put(DEFAULT_LAYOUT_KEY, "{ not json").unwrap();
        let p = LayoutPersistence::new(store, DEFAULT_LAYOUT_KEY);
        assert_eq!(p.load(), None);
        assert_eq!(p.load_or_default(), Layout::default_layout());
    }

    #[test]
    fn unknown_type_survives_load() {
        let content = r#"{"version": 1, "widgets": [
            {"id": "ticker_1", "type": "stock_ticker", "title": "Stocks",
             "gridX": 0, "gridY": 0, "width": 1, "height": 1}
        ], "background": "default"}"#;
        let (layout, _) = LayoutRecord::parse(content).unwrap();
        assert_eq!(layout.widgets.len(), 1);
        assert_eq!(layout.widgets[0].kind, "stock_ticker");
    }
}
