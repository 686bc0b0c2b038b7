use crate::dashboard::drag::{DragController, DragEvent, DragOutcome};
use crate::dashboard::grid::{GridCell, GridGeometry};
use crate::dashboard::layout::{Widget as PlacedWidget, COLUMNS};
use crate::dashboard::store::LayoutStore;
use crate::dashboard::widgets::{Widget, WidgetAction};
use crate::favorites::FavoriteEntry;
use chrono::{DateTime, Local};
use eframe::egui;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_ROW_HEIGHT: f32 = 140.0;
const CELL_GAP: f32 = 4.0;
const CELL_PADDING: f32 = 6.0;

/// Context shared with widgets at render time.
pub struct DashboardContext<'a> {
    pub now: DateTime<Local>,
    pub favorites: &'a [FavoriteEntry],
}

impl<'a> DashboardContext<'a> {
    pub fn new(favorites: &'a [FavoriteEntry]) -> Self {
        Self {
            now: Local::now(),
            favorites,
        }
    }
}

/// Fill colour for a background selector. Unknown values look like `default`.
pub fn background_fill(name: &str) -> egui::Color32 {
    match name {
        "sunrise" => egui::Color32::from_rgb(250, 214, 165),
        "ocean" => egui::Color32::from_rgb(164, 202, 230),
        "forest" => egui::Color32::from_rgb(176, 208, 168),
        "night" => egui::Color32::from_rgb(32, 36, 52),
        _ => egui::Color32::from_rgb(236, 238, 242),
    }
}

struct WidgetRuntime {
    kind: String,
    settings: Value,
    widget: Box<dyn Widget>,
}

struct SettingsEditor {
    id: String,
    kind: String,
    title: String,
    draft: Value,
    error: Option<String>,
}

#[derive(Default)]
struct ShellResponse {
    action: Option<WidgetAction>,
    remove: bool,
    open_settings: bool,
    handle: Option<egui::Response>,
}

/// Renders the layout as a grid of widget shells and routes edit-mode
/// gestures to the layout store.
pub struct Dashboard {
    store: LayoutStore,
    drag: DragController,
    runtimes: HashMap<String, WidgetRuntime>,
    editor: Option<SettingsEditor>,
    row_height: f32,
}

impl Dashboard {
    pub fn new(store: LayoutStore, row_height: f32) -> Self {
        Self {
            store,
            drag: DragController::new(),
            runtimes: HashMap::new(),
            editor: None,
            row_height: row_height.max(24.0),
        }
    }

    pub fn store(&self) -> &LayoutStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut LayoutStore {
        &mut self.store
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn edit_mode(&self) -> bool {
        self.drag.edit_mode()
    }

    pub fn set_edit_mode(&mut self, on: bool) {
        self.drag.set_edit_mode(on);
        if !on {
            self.editor = None;
        }
    }

    /// Number of widget instances currently alive.
    pub fn live_widgets(&self) -> usize {
        self.runtimes.len()
    }

    pub fn background(&self) -> egui::Color32 {
        background_fill(self.store.layout().background_or_default())
    }

    pub fn grid_geometry(&self, rect: egui::Rect) -> GridGeometry {
        GridGeometry::new(rect, self.row_height)
    }

    pub fn handle_drag(&mut self, event: DragEvent, grid: &GridGeometry) -> DragOutcome {
        let outcome = self.drag.handle(event, grid, &mut self.store);
        if let DragOutcome::Committed { widget_id, cell } = &outcome {
            tracing::debug!(id = %widget_id, x = cell.x, y = cell.y, "drag committed");
        }
        outcome
    }

    /// Create instances for new widgets, drop those of removed ones and push
    /// changed settings into the ones that stay.
    fn sync_runtimes(&mut self) {
        let layout = self.store.layout();
        let registry = self.store.registry();
        self.runtimes
            .retain(|id, rt| layout.get(id).is_some_and(|w| w.kind == rt.kind));
        for w in &layout.widgets {
            match self.runtimes.get_mut(&w.id) {
                Some(rt) => {
                    if rt.settings == w.settings {
                        continue;
                    }
                    if w.settings.is_null() {
                        rt.widget = registry.create(&w.kind, &w.settings);
                    } else {
                        rt.widget.on_settings_updated(&w.settings);
                    }
                    rt.settings = w.settings.clone();
                }
                None => {
                    let widget = registry.create(&w.kind, &w.settings);
                    self.runtimes.insert(
                        w.id.clone(),
                        WidgetRuntime {
                            kind: w.kind.clone(),
                            settings: w.settings.clone(),
                            widget,
                        },
                    );
                }
            }
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &DashboardContext<'_>) -> Option<WidgetAction> {
        self.sync_runtimes();
        let edit_mode = self.edit_mode();
        if self.store.layout().widgets.is_empty() && !edit_mode {
            ui.weak("This dashboard is empty. Switch to edit mode to add widgets.");
            return None;
        }

        let rows = self
            .store
            .layout()
            .rows()
            .max(1)
            .saturating_add(u32::from(edit_mode));
        let width = ui.available_width().max(COLUMNS as f32);
        let (rect, _) = ui.allocate_exact_size(
            egui::vec2(width, self.row_height * rows as f32),
            egui::Sense::hover(),
        );
        let grid = self.grid_geometry(rect);
        if edit_mode {
            Self::paint_cells(ui, &grid, rows);
        }

        let dragging = self.drag.dragging_id().map(str::to_string);
        let mut action = None;
        let mut removed = Vec::new();
        let mut open_settings = None;
        let mut drag_events = Vec::new();

        for widget in &self.store.layout().widgets {
            let Some(runtime) = self.runtimes.get_mut(&widget.id) else {
                continue;
            };
            let cell = grid.widget_rect(widget);
            let is_dragged = dragging.as_deref() == Some(widget.id.as_str());
            if !is_dragged && !ui.clip_rect().intersects(cell) {
                continue;
            }
            let descriptor = self.store.registry().descriptor_or_placeholder(&widget.kind);
            let shell = Self::widget_shell(
                ui,
                cell.shrink(CELL_GAP),
                widget,
                &descriptor.icon,
                descriptor.settings_ui().is_some(),
                runtime,
                ctx,
                edit_mode,
                is_dragged,
            );
            action = action.or(shell.action);
            if shell.remove {
                removed.push(widget.id.clone());
            }
            if shell.open_settings {
                open_settings = Some(widget.id.clone());
            }
            if let Some(event) = shell
                .handle
                .and_then(|h| Self::drag_event(&h, &widget.id, cell.min, dragging.as_deref()))
            {
                drag_events.push(event);
            }
        }

        for id in removed {
            self.store.remove_widget(&id);
        }
        for event in drag_events {
            self.handle_drag(event, &grid);
        }
        if self.drag.is_dragging() {
            let (escape, has_pointer, any_down) = ui.input(|i| {
                (
                    i.key_pressed(egui::Key::Escape),
                    i.pointer.has_pointer(),
                    i.pointer.any_down(),
                )
            });
            if escape || (has_pointer && !any_down) {
                self.handle_drag(DragEvent::Cancel, &grid);
            } else if !has_pointer {
                self.handle_drag(DragEvent::PointerLeft, &grid);
            }
        }
        self.paint_ghost(ui, &grid);

        if let Some(id) = open_settings {
            self.open_settings_editor(&id);
        }
        self.settings_window(ui.ctx());
        action
    }

    fn drag_event(
        handle: &egui::Response,
        id: &str,
        origin: egui::Pos2,
        dragging: Option<&str>,
    ) -> Option<DragEvent> {
        if handle.drag_started() {
            return handle.interact_pointer_pos().map(|pointer| DragEvent::Start {
                widget_id: id.to_string(),
                pointer,
                widget_origin: origin,
            });
        }
        if dragging != Some(id) {
            return None;
        }
        if handle.drag_stopped() {
            return Some(match handle.interact_pointer_pos() {
                Some(pointer) => DragEvent::Drop { pointer },
                None => DragEvent::PointerLeft,
            });
        }
        if handle.dragged() {
            return handle
                .interact_pointer_pos()
                .map(|pointer| DragEvent::Over { pointer });
        }
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn widget_shell(
        ui: &mut egui::Ui,
        rect: egui::Rect,
        widget: &PlacedWidget,
        icon: &str,
        has_settings: bool,
        runtime: &mut WidgetRuntime,
        ctx: &DashboardContext<'_>,
        edit_mode: bool,
        lifted: bool,
    ) -> ShellResponse {
        let (fill, stroke) = {
            let visuals = ui.visuals();
            let fill = if lifted {
                visuals.faint_bg_color
            } else {
                visuals.panel_fill
            };
            let stroke = if edit_mode {
                visuals.selection.stroke
            } else {
                visuals.widgets.noninteractive.bg_stroke
            };
            (fill, stroke)
        };
        ui.painter().rect(rect, 6.0, fill, stroke);

        let inner = rect.shrink(CELL_PADDING);
        let mut shell = ShellResponse::default();
        ui.allocate_ui_at_rect(inner, |ui| {
            ui.set_clip_rect(inner.intersect(ui.clip_rect()));
            ui.horizontal(|ui| {
                if edit_mode {
                    let handle = ui
                        .add(egui::Label::new("✥").sense(egui::Sense::drag()))
                        .on_hover_text("Drag to move");
                    shell.handle = Some(handle);
                }
                ui.label(egui::RichText::new(format!("{icon} {}", widget.title)).strong());
                if edit_mode {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✖").on_hover_text("Remove widget").clicked() {
                            shell.remove = true;
                        }
                        if has_settings && ui.small_button("⚙").on_hover_text("Settings").clicked()
                        {
                            shell.open_settings = true;
                        }
                    });
                }
            });
            shell.action = egui::ScrollArea::vertical()
                .id_source(("widget-body", widget.id.as_str()))
                .auto_shrink([false; 2])
                .show(ui, |ui| runtime.widget.render(ui, ctx))
                .inner;
        });
        shell
    }

    fn paint_cells(ui: &egui::Ui, grid: &GridGeometry, rows: u32) {
        let stroke = egui::Stroke::new(1.0, ui.visuals().weak_text_color().gamma_multiply(0.3));
        let painter = ui.painter();
        for y in grid.visible_rows(ui.clip_rect(), rows) {
            for x in 0..COLUMNS {
                painter.rect_stroke(
                    grid.cell_rect(GridCell { x, y }, 1, 1).shrink(CELL_GAP),
                    4.0,
                    stroke,
                );
            }
        }
    }

    fn paint_ghost(&self, ui: &egui::Ui, grid: &GridGeometry) {
        let (Some(ghost), Some(snap)) = (
            self.drag.preview_rect(&self.store, grid),
            self.drag.snap_rect(&self.store, grid),
        ) else {
            return;
        };
        let accent = ui.visuals().selection.bg_fill;
        let painter = ui.painter();
        painter.rect_stroke(snap.shrink(CELL_GAP), 6.0, egui::Stroke::new(2.0, accent));
        painter.rect_filled(ghost.shrink(CELL_GAP), 6.0, accent.gamma_multiply(0.35));
        ui.ctx().request_repaint();
    }

    fn open_settings_editor(&mut self, id: &str) {
        let Some(widget) = self.store.layout().get(id) else {
            return;
        };
        let draft = if widget.settings.is_null() {
            self.store
                .registry()
                .default_settings(&widget.kind)
                .unwrap_or(Value::Null)
        } else {
            widget.settings.clone()
        };
        self.editor = Some(SettingsEditor {
            id: widget.id.clone(),
            kind: widget.kind.clone(),
            title: widget.title.clone(),
            draft,
            error: None,
        });
    }

    fn settings_window(&mut self, ctx: &egui::Context) {
        let registry = Arc::clone(self.store.registry());
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        if !self.store.layout().contains(&editor.id) {
            self.editor = None;
            return;
        }
        let mut open = true;
        let mut save = false;
        let mut cancel = false;
        egui::Window::new(format!("{} settings", editor.title))
            .id(egui::Id::new(("widget-settings", editor.id.as_str())))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                match registry.render_settings_ui(&editor.kind, ui, &mut editor.draft) {
                    Some(result) => editor.error = result.error,
                    None => {
                        ui.label("This widget has no settings.");
                    }
                }
                if let Some(err) = &editor.error {
                    ui.colored_label(ui.visuals().error_fg_color, err);
                }
                ui.separator();
                ui.horizontal(|ui| {
                    save = ui.button("Save").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });
        if save {
            if let Some(editor) = self.editor.take() {
                self.store.update_settings(&editor.id, editor.draft);
            }
        } else if cancel || !open {
            self.editor = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::config::{LayoutPersistence, LayoutRecord, DEFAULT_LAYOUT_KEY};
    use crate::dashboard::layout::Layout;
    use crate::dashboard::storage::MemoryStore;
    use crate::dashboard::widgets::{WidgetDescriptor, WidgetRegistry};
    use once_cell::sync::Lazy;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default, Serialize, Deserialize)]
    struct RecordingConfig {
        #[serde(default)]
        label: String,
    }

    struct RecordingWidget {
        label: String,
    }

    static CREATED: Lazy<Mutex<HashMap<String, usize>>> = Lazy::new(|| Mutex::new(HashMap::new()));
    static UPDATED: Lazy<Mutex<HashMap<String, usize>>> = Lazy::new(|| Mutex::new(HashMap::new()));
    static CLIPS: Lazy<Mutex<HashMap<String, egui::Rect>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));

    fn bump(map: &Lazy<Mutex<HashMap<String, usize>>>, label: &str) {
        *map.lock().unwrap().entry(label.to_string()).or_default() += 1;
    }

    fn count(map: &Lazy<Mutex<HashMap<String, usize>>>, label: &str) -> usize {
        map.lock().unwrap().get(label).copied().unwrap_or(0)
    }

    impl RecordingWidget {
        fn new(cfg: RecordingConfig) -> Self {
            bump(&CREATED, &cfg.label);
            Self { label: cfg.label }
        }
    }

    impl Widget for RecordingWidget {
        fn render(
            &mut self,
            ui: &mut egui::Ui,
            _ctx: &DashboardContext<'_>,
        ) -> Option<WidgetAction> {
            CLIPS
                .lock()
                .unwrap()
                .insert(self.label.clone(), ui.clip_rect());
            None
        }

        fn on_settings_updated(&mut self, settings: &Value) {
            if let Ok(cfg) = serde_json::from_value::<RecordingConfig>(settings.clone()) {
                self.label = cfg.label;
                bump(&UPDATED, &self.label);
            }
        }
    }

    fn registry() -> WidgetRegistry {
        let mut reg = WidgetRegistry::default();
        reg.register(
            "record",
            WidgetDescriptor::new("Recorder", "R", (1, 1), RecordingWidget::new),
        );
        reg
    }

    fn recording(id: &str, label: &str, x: i64, y: i64, width: u32) -> PlacedWidget {
        PlacedWidget {
            settings: json!({ "label": label }),
            ..PlacedWidget::new(id, "record", "Recorder", (width, 1)).at(x, y)
        }
    }

    fn dashboard(widgets: Vec<PlacedWidget>) -> Dashboard {
        let persistence = LayoutPersistence::new(MemoryStore::new(), DEFAULT_LAYOUT_KEY);
        persistence
            .save(&Layout {
                widgets,
                ..Layout::default()
            })
            .unwrap();
        let store = LayoutStore::open(persistence, Arc::new(registry()));
        Dashboard::new(store, 80.0)
    }

    fn frame(dashboard: &mut Dashboard) {
        let ctx = DashboardContext::new(&[]);
        egui::__run_test_ui(|ui| {
            let rect = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(600.0, 400.0));
            ui.allocate_ui_at_rect(rect, |ui| {
                dashboard.ui(ui, &ctx);
            });
        });
    }

    fn clip(label: &str) -> egui::Rect {
        CLIPS.lock().unwrap()[label]
    }

    #[test]
    fn widget_is_clipped_to_its_span() {
        let mut d = dashboard(vec![recording("a", "span-a", 1, 0, 2)]);
        frame(&mut d);
        let rect = clip("span-a");
        assert!(rect.min.x >= 100.0 - f32::EPSILON);
        assert!(rect.max.x <= 300.0 + f32::EPSILON);
        assert!(rect.max.y <= 80.0 + f32::EPSILON);
    }

    #[test]
    fn span_is_cut_at_right_edge() {
        let mut d = dashboard(vec![recording("edge", "span-edge", 5, 1, 2)]);
        frame(&mut d);
        let rect = clip("span-edge");
        assert!(rect.min.x >= 500.0 - f32::EPSILON);
        assert!(rect.max.x <= 600.0 + f32::EPSILON);
        assert!(rect.min.y >= 80.0 - f32::EPSILON);
    }

    #[test]
    fn instances_survive_frames_and_receive_settings() {
        let mut d = dashboard(vec![recording("w", "reuse-a", 0, 0, 1)]);
        frame(&mut d);
        frame(&mut d);
        assert_eq!(count(&CREATED, "reuse-a"), 1);

        assert!(d
            .store_mut()
            .update_settings("w", json!({ "label": "reuse-b" })));
        frame(&mut d);
        assert_eq!(count(&CREATED, "reuse-b"), 0);
        assert_eq!(count(&UPDATED, "reuse-b"), 1);
        assert!(CLIPS.lock().unwrap().contains_key("reuse-b"));
    }

    #[test]
    fn removed_widgets_drop_their_instance() {
        let mut d = dashboard(vec![
            recording("keep", "drop-keep", 0, 0, 1),
            recording("gone", "drop-gone", 1, 0, 1),
        ]);
        frame(&mut d);
        assert_eq!(d.live_widgets(), 2);
        d.store_mut().remove_widget("gone");
        frame(&mut d);
        assert_eq!(d.live_widgets(), 1);
    }

    #[test]
    fn unknown_type_renders_placeholder() {
        let mut d = dashboard(vec![PlacedWidget::new(
            "ticker",
            "stock_ticker",
            "Stocks",
            (1, 1),
        )]);
        d.set_edit_mode(true);
        frame(&mut d);
        assert_eq!(d.live_widgets(), 1);
        assert!(d.store().layout().contains("ticker"));
    }

    #[test]
    fn drag_through_dashboard_commits_to_store() {
        let mut d = dashboard(vec![recording("mover", "drag-mover", 0, 0, 1)]);
        d.set_edit_mode(true);
        let grid = d.grid_geometry(egui::Rect::from_min_size(
            egui::Pos2::ZERO,
            egui::vec2(600.0, 400.0),
        ));
        d.handle_drag(
            DragEvent::Start {
                widget_id: "mover".into(),
                pointer: egui::pos2(10.0, 10.0),
                widget_origin: egui::Pos2::ZERO,
            },
            &grid,
        );
        let out = d.handle_drag(
            DragEvent::Drop {
                pointer: egui::pos2(410.0, 170.0),
            },
            &grid,
        );
        assert_eq!(
            out,
            DragOutcome::Committed {
                widget_id: "mover".into(),
                cell: GridCell { x: 4, y: 2 },
            }
        );
        let w = d.store().layout().get("mover").unwrap();
        assert_eq!((w.grid_x, w.grid_y), (4, 2));
    }

    #[test]
    fn leaving_edit_mode_stops_drag() {
        let mut d = dashboard(vec![recording("m", "edit-m", 0, 0, 1)]);
        d.set_edit_mode(true);
        let grid = d.grid_geometry(egui::Rect::from_min_size(
            egui::Pos2::ZERO,
            egui::vec2(600.0, 400.0),
        ));
        d.handle_drag(
            DragEvent::Start {
                widget_id: "m".into(),
                pointer: egui::pos2(5.0, 5.0),
                widget_origin: egui::Pos2::ZERO,
            },
            &grid,
        );
        assert!(d.drag().is_dragging());
        d.set_edit_mode(false);
        assert!(!d.drag().is_dragging());
    }

    #[test]
    fn edit_mode_handles_rows_far_below_the_viewport() {
        let (layout, _) = LayoutRecord::parse(
            r#"{"version": 1, "widgets": [
                {"id": "far", "type": "record", "gridX": 0, "gridY": 4294967295,
                 "settings": {"label": "far-row"}},
                {"id": "deep", "type": "record", "gridX": 1, "gridY": 10000000,
                 "settings": {"label": "deep-row"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(layout.rows(), u32::MAX);
        let mut d = dashboard(layout.widgets);
        d.set_edit_mode(true);
        frame(&mut d);
        frame(&mut d);
        assert_eq!(d.store().layout().get("far").map(|w| w.grid_y), Some(u32::MAX));
        assert!(!CLIPS.lock().unwrap().contains_key("far-row"));
        assert_eq!(d.store().layout().get("deep").map(|w| w.title.as_str()), Some("Recorder"));
    }

    #[test]
    fn unknown_backgrounds_fall_back_to_default() {
        assert_eq!(background_fill("custom-photo"), background_fill("default"));
        assert_ne!(background_fill("night"), background_fill("default"));
    }
}
