use super::{Widget, WidgetAction};
use crate::dashboard::dashboard::DashboardContext;
use eframe::egui;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub text: String,
    pub done: bool,
}

/// Session-local to-do items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoList {
    items: Vec<TodoItem>,
}

impl TodoList {
    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    /// Adds a trimmed item; blank input is ignored.
    pub fn add(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.items.push(TodoItem {
            text: text.to_string(),
            done: false,
        });
        true
    }

    pub fn toggle(&mut self, idx: usize) {
        if let Some(item) = self.items.get_mut(idx) {
            item.done = !item.done;
        }
    }

    pub fn remove(&mut self, idx: usize) {
        if idx < self.items.len() {
            self.items.remove(idx);
        }
    }

    pub fn clear_done(&mut self) {
        self.items.retain(|t| !t.done);
    }

    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|t| !t.done).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TodoConfig {
    #[serde(default)]
    pub hide_done: bool,
}

pub struct TodoWidget {
    cfg: TodoConfig,
    list: TodoList,
    input: String,
}

impl TodoWidget {
    pub fn new(cfg: TodoConfig) -> Self {
        Self {
            cfg,
            list: TodoList::default(),
            input: String::new(),
        }
    }
}

impl Widget for TodoWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) -> Option<WidgetAction> {
        ui.horizontal(|ui| {
            let resp = ui.add(
                egui::TextEdit::singleline(&mut self.input)
                    .hint_text("New task")
                    .desired_width(ui.available_width() - 30.0),
            );
            let submitted = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if (ui.small_button("+").clicked() || submitted) && self.list.add(&self.input) {
                self.input.clear();
            }
        });

        let mut toggled = None;
        let mut removed = None;
        for (idx, item) in self.list.items().iter().enumerate() {
            if self.cfg.hide_done && item.done {
                continue;
            }
            ui.horizontal(|ui| {
                let mut done = item.done;
                if ui.checkbox(&mut done, "").changed() {
                    toggled = Some(idx);
                }
                let text = if item.done {
                    egui::RichText::new(&item.text).strikethrough().weak()
                } else {
                    egui::RichText::new(&item.text)
                };
                ui.label(text);
                if ui.small_button("✕").clicked() {
                    removed = Some(idx);
                }
            });
        }
        if let Some(idx) = toggled {
            self.list.toggle(idx);
        }
        if let Some(idx) = removed {
            self.list.remove(idx);
        }

        if !self.list.items().is_empty() {
            ui.horizontal(|ui| {
                ui.weak(format!("{} left", self.list.remaining()));
                if ui.small_button("Clear done").clicked() {
                    self.list.clear_done();
                }
            });
        }
        None
    }
}
