//! Pointer-gesture state machine that turns drags into committed grid moves.
//!
//! The controller never holds a widget position of its own: the layout store
//! stays the single source of truth and the only thing kept during a gesture
//! is the ephemeral pointer offset used to draw the ghost preview.

use crate::dashboard::grid::{GridCell, GridGeometry};
use crate::dashboard::store::LayoutStore;
use eframe::egui::{Pos2, Rect, Vec2};

/// An in-flight drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragGesture {
    pub widget_id: String,
    /// Pointer position relative to the widget's origin when the drag began.
    pub grab_offset: Vec2,
    pub pointer: Pos2,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragGesture),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    Start {
        widget_id: String,
        pointer: Pos2,
        widget_origin: Pos2,
    },
    Over {
        pointer: Pos2,
    },
    Drop {
        pointer: Pos2,
    },
    Cancel,
    /// The pointer left the window mid-gesture.
    PointerLeft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    Ignored,
    Started,
    /// Cell the widget would land in if dropped now.
    Hover(GridCell),
    Committed { widget_id: String, cell: GridCell },
    Cancelled,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
    edit_mode: bool,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn dragging_id(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging(g) => Some(&g.widget_id),
            DragState::Idle => None,
        }
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    /// Leaving edit mode abandons any gesture in progress.
    pub fn set_edit_mode(&mut self, on: bool) {
        if !on && self.is_dragging() {
            tracing::debug!("edit mode closed during drag, gesture cancelled");
            self.state = DragState::Idle;
        }
        self.edit_mode = on;
    }

    /// Cell the dragged widget's origin maps to for a pointer position.
    pub fn target_cell(gesture: &DragGesture, pointer: Pos2, grid: &GridGeometry) -> GridCell {
        grid.cell_at(pointer - gesture.grab_offset)
    }

    /// Screen rectangle of the ghost preview following the pointer.
    pub fn preview_rect(&self, store: &LayoutStore, grid: &GridGeometry) -> Option<Rect> {
        let DragState::Dragging(gesture) = &self.state else {
            return None;
        };
        let widget = store.layout().get(&gesture.widget_id)?;
        let size = grid.widget_rect(widget).size();
        Some(Rect::from_min_size(gesture.pointer - gesture.grab_offset, size))
    }

    /// Rectangle of the cell the widget would snap to.
    pub fn snap_rect(&self, store: &LayoutStore, grid: &GridGeometry) -> Option<Rect> {
        let DragState::Dragging(gesture) = &self.state else {
            return None;
        };
        let widget = store.layout().get(&gesture.widget_id)?;
        let cell = Self::target_cell(gesture, gesture.pointer, grid);
        let mut snapped = widget.clone();
        snapped.grid_x = cell.x;
        snapped.grid_y = cell.y;
        Some(grid.widget_rect(&snapped))
    }

    pub fn handle(
        &mut self,
        event: DragEvent,
        grid: &GridGeometry,
        store: &mut LayoutStore,
    ) -> DragOutcome {
        match (&mut self.state, event) {
            (
                DragState::Idle,
                DragEvent::Start {
                    widget_id,
                    pointer,
                    widget_origin,
                },
            ) => {
                if !self.edit_mode {
                    return DragOutcome::Ignored;
                }
                if !store.layout().contains(&widget_id) {
                    tracing::debug!(id = %widget_id, "drag start for unknown widget ignored");
                    return DragOutcome::Ignored;
                }
                tracing::debug!(id = %widget_id, "drag started");
                self.state = DragState::Dragging(DragGesture {
                    widget_id,
                    grab_offset: pointer - widget_origin,
                    pointer,
                });
                DragOutcome::Started
            }
            (DragState::Dragging(gesture), DragEvent::Over { pointer }) => {
                gesture.pointer = pointer;
                DragOutcome::Hover(Self::target_cell(gesture, pointer, grid))
            }
            (DragState::Dragging(gesture), DragEvent::Drop { pointer }) => {
                if !grid.contains(pointer) {
                    tracing::debug!(id = %gesture.widget_id, "dropped outside grid, move discarded");
                    self.state = DragState::Idle;
                    return DragOutcome::Cancelled;
                }
                let cell = Self::target_cell(gesture, pointer, grid);
                let widget_id = std::mem::take(&mut gesture.widget_id);
                self.state = DragState::Idle;
                store.move_widget(&widget_id, cell.x as i64, cell.y as i64);
                DragOutcome::Committed { widget_id, cell }
            }
            (DragState::Dragging(_), DragEvent::Cancel | DragEvent::PointerLeft) => {
                tracing::debug!("drag cancelled");
                self.state = DragState::Idle;
                DragOutcome::Cancelled
            }
            _ => DragOutcome::Ignored,
        }
    }
}
