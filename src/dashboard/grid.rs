use crate::dashboard::layout::{clamp_x, clamp_y, Widget, COLUMNS};
use eframe::egui::{pos2, vec2, Pos2, Rect};
use std::ops::Range;

/// A zero-based grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub x: u32,
    pub y: u32,
}

/// Screen geometry of the grid container: `COLUMNS` equal tracks spanning the
/// container width and fixed-height rows growing downward from its top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub rect: Rect,
    pub row_height: f32,
}

impl GridGeometry {
    pub fn new(rect: Rect, row_height: f32) -> Self {
        Self {
            rect,
            row_height: row_height.max(1.0),
        }
    }

    pub fn column_width(&self) -> f32 {
        (self.rect.width() / COLUMNS as f32).max(1.0)
    }

    pub fn contains(&self, pos: Pos2) -> bool {
        self.rect.contains(pos)
    }

    /// Quantize a screen position to a cell. Positions outside the container
    /// are clamped, never rejected.
    pub fn cell_at(&self, pos: Pos2) -> GridCell {
        let col = ((pos.x - self.rect.left()) / self.column_width()).floor();
        let row = ((pos.y - self.rect.top()) / self.row_height).floor();
        GridCell {
            x: clamp_x(finite_or_zero(col)),
            y: clamp_y(finite_or_zero(row)),
        }
    }

    pub fn cell_origin(&self, cell: GridCell) -> Pos2 {
        pos2(
            self.rect.left() + cell.x as f32 * self.column_width(),
            self.rect.top() + cell.y as f32 * self.row_height,
        )
    }

    pub fn cell_rect(&self, cell: GridCell, width: u32, height: u32) -> Rect {
        Rect::from_min_size(
            self.cell_origin(cell),
            vec2(
                self.column_width() * width as f32,
                self.row_height * height as f32,
            ),
        )
    }

    /// Rectangle covered by a widget, with its span cut at the right edge.
    pub fn widget_rect(&self, widget: &Widget) -> Rect {
        self.cell_rect(
            GridCell {
                x: widget.grid_x,
                y: widget.grid_y,
            },
            widget.visible_width(),
            widget.height,
        )
    }

    pub fn content_height(&self, rows: u32) -> f32 {
        self.row_height * rows as f32
    }

    /// Rows of the first `rows` that intersect `clip`.
    pub fn visible_rows(&self, clip: Rect, rows: u32) -> Range<u32> {
        // float-to-int casts saturate, so an unbounded clip maps to `rows`
        let to_row = |v: f32| clamp_y(v as i64).min(rows);
        let first = to_row(((clip.top() - self.rect.top()) / self.row_height).floor());
        let last = to_row(((clip.bottom() - self.rect.top()) / self.row_height).ceil());
        first..last.max(first)
    }
}

fn finite_or_zero(v: f32) -> i64 {
    if v.is_finite() {
        v as i64
    } else {
        0
    }
}
