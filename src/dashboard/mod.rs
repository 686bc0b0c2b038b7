pub mod config;
pub mod dashboard;
pub mod drag;
pub mod grid;
pub mod layout;
pub mod storage;
pub mod store;
pub mod widgets;

pub use config::{LayoutPersistence, LayoutRecord, WidgetRecord, DEFAULT_LAYOUT_KEY};
pub use dashboard::{background_fill, Dashboard, DashboardContext, DEFAULT_ROW_HEIGHT};
pub use drag::{DragController, DragEvent, DragOutcome, DragState};
pub use grid::{GridCell, GridGeometry};
pub use layout::{Layout, Widget, BACKGROUNDS, COLUMNS, DEFAULT_BACKGROUND};
pub use storage::{
    BackgroundStore, FileStore, KeyValueStore, MemoryStore, RetryingStore, StorageError,
};
pub use store::LayoutStore;
pub use widgets::{WidgetAction, WidgetDescriptor, WidgetRegistry};
