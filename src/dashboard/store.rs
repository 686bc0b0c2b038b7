use crate::dashboard::config::LayoutPersistence;
use crate::dashboard::grid::GridCell;
use crate::dashboard::layout::{clamp_x, clamp_y, Layout, Widget};
use crate::dashboard::widgets::WidgetRegistry;
use serde_json::Value;
use std::sync::Arc;

/// Owner of the session's layout. Every mutation updates memory first and
/// then writes the whole layout through to persistence.
pub struct LayoutStore {
    layout: Layout,
    persistence: LayoutPersistence,
    registry: Arc<WidgetRegistry>,
    notices: Vec<String>,
    last_stamp: i64,
}

impl LayoutStore {
    /// Load the saved layout, falling back to the default one.
    pub fn open(persistence: LayoutPersistence, registry: Arc<WidgetRegistry>) -> Self {
        let mut layout = persistence.load_or_default();
        for w in &mut layout.widgets {
            if !registry.contains(&w.kind) {
                tracing::warn!(id = %w.id, widget = %w.kind, "layout references unknown widget type");
            }
            if w.title.trim().is_empty() {
                w.title = default_title(&registry, &w.kind);
            }
        }
        Self {
            layout,
            persistence,
            registry,
            notices: Vec::new(),
            last_stamp: 0,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn snapshot(&self) -> Layout {
        self.layout.clone()
    }

    pub fn registry(&self) -> &Arc<WidgetRegistry> {
        &self.registry
    }

    /// Place a new widget of `kind` with its registry default size. Without
    /// an explicit position it goes to column 0 below every existing widget.
    pub fn add_widget(&mut self, kind: &str, position: Option<GridCell>) -> Widget {
        let size = self.registry.descriptor_or_placeholder(kind).default_size();
        let title = default_title(&self.registry, kind);
        let cell = position.unwrap_or(GridCell {
            x: 0,
            y: self.layout.rows(),
        });
        let id = self.fresh_id(kind);
        let widget = Widget::new(&id, kind, &title, size)
            .at(cell.x as i64, cell.y as i64);
        tracing::debug!(%id, widget = %kind, x = widget.grid_x, y = widget.grid_y, "widget added");
        self.layout.widgets.push(widget.clone());
        self.persist();
        widget
    }

    /// Remove a widget. Unknown ids are ignored.
    pub fn remove_widget(&mut self, id: &str) {
        let before = self.layout.widgets.len();
        self.layout.widgets.retain(|w| w.id != id);
        if self.layout.widgets.len() == before {
            tracing::debug!(%id, "remove ignored, widget not found");
            return;
        }
        tracing::debug!(%id, "widget removed");
        self.persist();
    }

    /// Move a widget, clamping the column to the grid and the row to >= 0.
    /// Unknown ids are ignored.
    pub fn move_widget(&mut self, id: &str, x: i64, y: i64) {
        let (x, y) = (clamp_x(x), clamp_y(y));
        let Some(widget) = self.layout.get_mut(id) else {
            tracing::debug!(%id, "move ignored, widget not found");
            return;
        };
        if widget.grid_x == x && widget.grid_y == y {
            return;
        }
        widget.grid_x = x;
        widget.grid_y = y;
        tracing::debug!(%id, x, y, "widget moved");
        self.persist();
    }

    /// Any string is accepted; unknown values render with the default look.
    pub fn set_background(&mut self, value: &str) {
        if self.layout.background == value {
            return;
        }
        self.layout.background = value.to_string();
        self.persist();
    }

    /// Replace a widget's settings blob. Unknown ids are ignored.
    pub fn update_settings(&mut self, id: &str, settings: Value) -> bool {
        let Some(widget) = self.layout.get_mut(id) else {
            return false;
        };
        if widget.settings == settings {
            return false;
        }
        widget.settings = settings;
        self.persist();
        true
    }

    /// Discard the current arrangement and return to the default layout.
    pub fn reset(&mut self) {
        tracing::info!("layout reset to defaults");
        self.layout = Layout::default_layout();
        self.persist();
    }

    /// Persistence problems since the last call, for non-blocking display.
    pub fn take_notices(&mut self) -> Vec<String> {
        for failure in self.persistence.take_failures() {
            self.notices.push(format!("Failed to save layout: {failure}"));
        }
        std::mem::take(&mut self.notices)
    }

    fn persist(&mut self) {
        if let Err(e) = self.persistence.save(&self.layout) {
            // the in-memory layout stays authoritative for the session
            tracing::warn!(key = %self.persistence.key(), "failed to save layout: {e}");
            self.notices.push(format!("Failed to save layout: {e}"));
        }
    }

    fn fresh_id(&mut self, kind: &str) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_stamp = now.max(self.last_stamp + 1);
        let mut id = format!("{kind}_{}", self.last_stamp);
        while self.layout.contains(&id) {
            self.last_stamp += 1;
            id = format!("{kind}_{}", self.last_stamp);
        }
        id
    }
}

/// Registry display name, or the raw tag for unregistered types.
fn default_title(registry: &WidgetRegistry, kind: &str) -> String {
    registry
        .descriptor(kind)
        .map(|d| d.name.clone())
        .unwrap_or_else(|| kind.to_string())
}
