use crate::dashboard::config::{LayoutPersistence, DEFAULT_LAYOUT_KEY};
use crate::dashboard::dashboard::DEFAULT_ROW_HEIGHT;
use crate::dashboard::storage::{BackgroundStore, FileStore, RetryingStore};
use crate::favorites::{MarkerFile, DEFAULT_FAVORITES_CAP, FAVORITES_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Directory holding the layout record and favorite markers. If `None`,
    /// the platform data directory is used.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Storage key of the layout record.
    #[serde(default = "default_dashboard_key")]
    pub dashboard_key: String,
    /// Height of one grid row in points.
    #[serde(default = "default_row_height")]
    pub row_height: f32,
    /// Marker file written by the link directory. Defaults to
    /// `favorites.json` inside the data directory.
    #[serde(default)]
    pub favorites_file: Option<PathBuf>,
    #[serde(default = "default_favorites_cap")]
    pub favorites_cap: usize,
    /// Seconds between rereads of the marker file.
    #[serde(default = "default_favorites_refresh")]
    pub favorites_refresh_secs: u64,
    /// Attempts per layout write before the failure is reported.
    #[serde(default = "default_storage_retries")]
    pub storage_retries: u32,
    /// Write layouts from a worker thread instead of the UI thread.
    #[serde(default)]
    pub background_writes: bool,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Enable toast notifications in the UI.
    #[serde(default = "default_toasts")]
    pub enable_toasts: bool,
    /// Duration of toast notifications in seconds.
    #[serde(default = "default_toast_duration")]
    pub toast_duration: f32,
}

fn default_dashboard_key() -> String {
    DEFAULT_LAYOUT_KEY.to_string()
}

fn default_row_height() -> f32 {
    DEFAULT_ROW_HEIGHT
}

fn default_favorites_cap() -> usize {
    DEFAULT_FAVORITES_CAP
}

fn default_favorites_refresh() -> u64 {
    30
}

fn default_storage_retries() -> u32 {
    3
}

fn default_toasts() -> bool {
    true
}

fn default_toast_duration() -> f32 {
    3.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            dashboard_key: default_dashboard_key(),
            row_height: default_row_height(),
            favorites_file: None,
            favorites_cap: default_favorites_cap(),
            favorites_refresh_secs: default_favorites_refresh(),
            storage_retries: default_storage_retries(),
            background_writes: false,
            debug_logging: false,
            log_file: None,
            enable_toasts: default_toasts(),
            toast_duration: default_toast_duration(),
        }
    }
}

impl Settings {
    /// Missing or empty files yield the defaults; malformed JSON is an error.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs_next::data_dir()
                .map(|d| d.join("startpage"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    pub fn favorites_path(&self) -> PathBuf {
        self.favorites_file
            .clone()
            .unwrap_or_else(|| self.data_dir().join(FAVORITES_FILE))
    }

    pub fn marker_file(&self) -> MarkerFile {
        MarkerFile::new(self.favorites_path())
    }

    pub fn favorites_refresh(&self) -> Duration {
        Duration::from_secs(self.favorites_refresh_secs.max(1))
    }

    /// File-backed layout persistence with bounded retries, optionally
    /// queued on a writer thread.
    pub fn layout_persistence(&self) -> LayoutPersistence {
        let files = FileStore::new(self.data_dir());
        let retrying = RetryingStore::new(files, self.storage_retries);
        if self.background_writes {
            LayoutPersistence::new(BackgroundStore::new(retrying), &self.dashboard_key)
        } else {
            LayoutPersistence::new(retrying, &self.dashboard_key)
        }
    }
}
