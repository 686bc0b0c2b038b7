use crate::dashboard::dashboard::{Dashboard, DashboardContext};
use crate::dashboard::layout::{Widget, BACKGROUNDS};
use crate::dashboard::store::LayoutStore;
use crate::dashboard::widgets::{TimedCache, WidgetAction, WidgetRegistry};
use crate::favorites::{list_favorites, FavoriteEntry, MarkerFile};
use crate::settings::Settings;
use crate::toast_log::append_toast_log;
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Top-level window: toolbar with the edit toggle and pickers above the
/// dashboard grid.
pub struct StartPageApp {
    settings: Settings,
    dashboard: Dashboard,
    markers: MarkerFile,
    favorites: TimedCache<Vec<FavoriteEntry>>,
    toasts: Toasts,
    data_dir: PathBuf,
}

impl StartPageApp {
    pub fn new(settings: Settings) -> Self {
        let data_dir = settings.data_dir();
        if let Err(e) = std::fs::create_dir_all(&data_dir) {
            tracing::warn!(dir = %data_dir.display(), "failed to create data directory: {e}");
        }
        let registry = Arc::new(WidgetRegistry::with_defaults());
        let store = LayoutStore::open(settings.layout_persistence(), registry);
        tracing::info!(
            widgets = store.layout().widgets.len(),
            key = %settings.dashboard_key,
            "dashboard loaded"
        );
        Self {
            dashboard: Dashboard::new(store, settings.row_height),
            markers: settings.marker_file(),
            favorites: TimedCache::new(Vec::new(), settings.favorites_refresh()),
            toasts: Toasts::new().anchor(egui::Align2::RIGHT_TOP, [10.0, 10.0]),
            data_dir,
            settings,
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn favorites(&self) -> &[FavoriteEntry] {
        &self.favorites.data
    }

    pub fn set_edit_mode(&mut self, on: bool) {
        tracing::debug!(on, "edit mode toggled");
        self.dashboard.set_edit_mode(on);
    }

    pub fn add_widget(&mut self, kind: &str) -> Widget {
        self.dashboard.store_mut().add_widget(kind, None)
    }

    pub fn set_background(&mut self, value: &str) {
        self.dashboard.store_mut().set_background(value);
    }

    pub fn reset_layout(&mut self) {
        self.dashboard.store_mut().reset();
        self.push_toast("Layout reset to defaults".into(), ToastKind::Info);
    }

    pub fn refresh_favorites(&mut self) {
        let cap = self.settings.favorites_cap;
        let markers = &self.markers;
        self.favorites
            .refresh(|list| *list = list_favorites(markers, cap));
    }

    fn push_toast(&mut self, text: String, kind: ToastKind) {
        append_toast_log(&self.data_dir, &text);
        if !self.settings.enable_toasts {
            return;
        }
        self.toasts.add(Toast {
            text: text.into(),
            kind,
            options: ToastOptions::default()
                .duration_in_seconds(self.settings.toast_duration as f64),
        });
    }

    /// Surface persistence problems collected since the last frame.
    pub fn drain_notices(&mut self) {
        for notice in self.dashboard.store_mut().take_notices() {
            self.push_toast(notice, ToastKind::Error);
        }
    }

    fn handle_action(&mut self, action: WidgetAction) {
        match action {
            WidgetAction::OpenUrl(url) => {
                tracing::debug!(%url, "opening link");
                if let Err(e) = open::that(&url) {
                    tracing::warn!(%url, "failed to open link: {e}");
                    self.push_toast(format!("Failed to open {url}: {e}"), ToastKind::Error);
                }
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mut edit = self.dashboard.edit_mode();
            if ui.toggle_value(&mut edit, "✏ Edit").changed() {
                self.set_edit_mode(edit);
            }
            if !edit {
                return;
            }

            let entries: Vec<(String, String)> = self
                .dashboard
                .store()
                .registry()
                .entries()
                .into_iter()
                .map(|(kind, d)| (kind.to_string(), format!("{} {}", d.icon, d.name)))
                .collect();
            ui.menu_button("➕ Add widget", |ui| {
                for (kind, label) in &entries {
                    if ui.button(label).clicked() {
                        self.add_widget(kind);
                        ui.close_menu();
                    }
                }
            });

            let current = self.dashboard.store().layout().background.clone();
            let mut selected = current.clone();
            egui::ComboBox::from_label("Background")
                .selected_text(&selected)
                .show_ui(ui, |ui| {
                    for bg in BACKGROUNDS {
                        ui.selectable_value(&mut selected, bg.to_string(), *bg);
                    }
                });
            if selected != current {
                self.set_background(&selected);
            }

            if ui.button("Reset layout").clicked() {
                self.reset_layout();
            }
        });
    }
}

impl eframe::App for StartPageApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.favorites.should_refresh() {
            self.refresh_favorites();
        }

        egui::TopBottomPanel::top("startpage_toolbar").show(ctx, |ui| self.toolbar(ui));

        let fill = self.dashboard.background();
        let action = egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(fill).inner_margin(8.0))
            .show(ctx, |ui| {
                let dctx = DashboardContext::new(&self.favorites.data);
                egui::ScrollArea::vertical()
                    .auto_shrink([false; 2])
                    .show(ui, |ui| self.dashboard.ui(ui, &dctx))
                    .inner
            })
            .inner;
        if let Some(action) = action {
            self.handle_action(action);
        }

        self.drain_notices();
        self.toasts.show(ctx);
        // keeps the clock ticking
        ctx.request_repaint_after(Duration::from_secs(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::layout::Layout;
    use crate::toast_log::TOAST_LOG_FILE;

    fn settings(dir: &std::path::Path) -> Settings {
        Settings {
            data_dir: Some(dir.to_path_buf()),
            enable_toasts: false,
            ..Settings::default()
        }
    }

    #[test]
    fn first_launch_uses_default_layout() {
        let dir = tempfile::tempdir().unwrap();
        let app = StartPageApp::new(settings(dir.path()));
        assert_eq!(app.dashboard().store().snapshot(), Layout::default_layout());
    }

    #[test]
    fn changes_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let added = {
            let mut app = StartPageApp::new(settings(dir.path()));
            app.set_background("ocean");
            app.add_widget("notes")
        };
        let app = StartPageApp::new(settings(dir.path()));
        let layout = app.dashboard().store().layout();
        assert_eq!(layout.background, "ocean");
        assert!(layout.contains(&added.id));
    }

    #[test]
    fn favorites_come_from_marker_file() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(dir.path());
        s.marker_file().mark("news", "https://bbc.com").unwrap();
        let mut app = StartPageApp::new(s);
        assert!(app.favorites().is_empty());
        app.refresh_favorites();
        assert_eq!(app.favorites().len(), 1);
        assert_eq!(app.favorites()[0].label(), "bbc.com");
    }

    #[test]
    fn reset_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = StartPageApp::new(settings(dir.path()));
        app.set_edit_mode(true);
        app.reset_layout();
        let log = std::fs::read_to_string(dir.path().join(TOAST_LOG_FILE)).unwrap();
        assert!(log.contains("Layout reset"));
    }
}
