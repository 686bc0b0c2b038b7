use serde_json::Value;

/// Number of fixed-width columns in the dashboard grid.
pub const COLUMNS: u32 = 6;

/// Background applied when nothing else has been chosen.
pub const DEFAULT_BACKGROUND: &str = "default";

/// Known background selectors. Anything else is stored verbatim and rendered
/// as [`DEFAULT_BACKGROUND`].
pub const BACKGROUNDS: &[&str] = &["default", "sunrise", "ocean", "forest", "night"];

/// A placed widget instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub grid_x: u32,
    pub grid_y: u32,
    pub width: u32,
    pub height: u32,
    /// Widget configuration (weather location, news links, ...). Content such
    /// as to-do items lives in the widget instance and is not stored here.
    pub settings: Value,
}

impl Widget {
    pub fn new(id: &str, kind: &str, title: &str, size: (u32, u32)) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            title: title.to_string(),
            grid_x: 0,
            grid_y: 0,
            width: clamp_width(size.0 as i64),
            height: clamp_height(size.1 as i64),
            settings: Value::Null,
        }
    }

    pub fn at(mut self, x: i64, y: i64) -> Self {
        self.grid_x = clamp_x(x);
        self.grid_y = clamp_y(y);
        self
    }

    /// Number of columns the widget can actually occupy from its column.
    pub fn visible_width(&self) -> u32 {
        self.width.min(COLUMNS - self.grid_x.min(COLUMNS - 1)).max(1)
    }

    /// First row below the widget.
    pub fn bottom(&self) -> u32 {
        self.grid_y.saturating_add(self.height)
    }

    pub fn covers(&self, x: u32, y: u32) -> bool {
        x >= self.grid_x
            && x < self.grid_x + self.visible_width()
            && y >= self.grid_y
            && y < self.bottom()
    }
}

pub fn clamp_x(x: i64) -> u32 {
    x.clamp(0, COLUMNS as i64 - 1) as u32
}

pub fn clamp_y(y: i64) -> u32 {
    y.clamp(0, u32::MAX as i64) as u32
}

pub fn clamp_width(w: i64) -> u32 {
    w.clamp(1, COLUMNS as i64) as u32
}

pub fn clamp_height(h: i64) -> u32 {
    h.clamp(1, u32::MAX as i64) as u32
}

/// Full state of one dashboard: ordered widgets plus background selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub widgets: Vec<Widget>,
    pub background: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            widgets: Vec::new(),
            background: DEFAULT_BACKGROUND.to_string(),
        }
    }
}

impl Layout {
    /// The layout shown on first visit and after a reset.
    pub fn default_layout() -> Self {
        let place = |kind: &str, title: &str, x: i64, y: i64, w: u32, h: u32| {
            Widget::new(&format!("{kind}_default"), kind, title, (w, h)).at(x, y)
        };
        Self {
            widgets: vec![
                place("clock", "Clock", 0, 0, 2, 1),
                place("search_google", "Google Search", 2, 0, 2, 1),
                place("search_bing", "Bing Search", 4, 0, 2, 1),
                place("weather", "Weather", 0, 1, 1, 1),
                place("calendar", "Calendar", 1, 1, 2, 2),
                place("todo", "To-do", 3, 1, 1, 2),
                place("favorites", "Favorites", 4, 1, 2, 1),
                place("calculator", "Calculator", 0, 2, 1, 2),
                place("notes", "Notes", 4, 2, 2, 1),
                place("news", "News", 1, 3, 2, 1),
            ],
            background: DEFAULT_BACKGROUND.to_string(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of rows in use; the grid grows downward without limit.
    pub fn rows(&self) -> u32 {
        self.widgets.iter().map(Widget::bottom).max().unwrap_or(0)
    }

    /// Ids of the widgets covering a cell, in insertion order.
    pub fn occupants(&self, x: u32, y: u32) -> Vec<&str> {
        self.widgets
            .iter()
            .filter(|w| w.covers(x, y))
            .map(|w| w.id.as_str())
            .collect()
    }

    pub fn background_or_default(&self) -> &str {
        if BACKGROUNDS.contains(&self.background.as_str()) {
            &self.background
        } else {
            DEFAULT_BACKGROUND
        }
    }
}
