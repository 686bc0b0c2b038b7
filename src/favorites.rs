//! Favorite-site markers recorded per link category and the merged view the
//! favorites widget shows.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const FAVORITES_FILE: &str = "favorites.json";

/// How many favorites the dashboard shows.
pub const DEFAULT_FAVORITES_CAP: usize = 8;

/// Site ids starred in each category, keyed by category.
pub type MarkerSets = BTreeMap<String, BTreeSet<String>>;

/// One starred site surfaced to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub category: String,
    pub site_id: String,
}

impl FavoriteEntry {
    pub fn new(category: &str, site_id: &str) -> Self {
        Self {
            category: category.to_string(),
            site_id: site_id.to_string(),
        }
    }

    /// The site as an openable address, when the id is an http(s) URL.
    pub fn url(&self) -> Option<url::Url> {
        let url = url::Url::parse(&self.site_id).ok()?;
        matches!(url.scheme(), "http" | "https").then_some(url)
    }

    /// Host name for URL ids, otherwise the raw id.
    pub fn label(&self) -> String {
        self.url()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
            .unwrap_or_else(|| self.site_id.clone())
    }
}

/// Read access to the favorite markers owned by the link directory.
pub trait FavoriteSource {
    fn marker_sets(&self) -> anyhow::Result<MarkerSets>;
}

impl FavoriteSource for MarkerSets {
    fn marker_sets(&self) -> anyhow::Result<MarkerSets> {
        Ok(self.clone())
    }
}

/// Marker sets stored as one JSON object of `category -> [site ids]`.
#[derive(Debug, Clone)]
pub struct MarkerFile {
    path: PathBuf,
}

impl MarkerFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<MarkerSets> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(MarkerSets::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(MarkerSets::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, sets: &MarkerSets) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(sets)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Star a site. Returns `false` when it was already starred.
    pub fn mark(&self, category: &str, site_id: &str) -> anyhow::Result<bool> {
        let mut sets = self.load()?;
        let added = sets
            .entry(category.to_string())
            .or_default()
            .insert(site_id.to_string());
        if added {
            self.save(&sets)?;
        }
        Ok(added)
    }

    /// Unstar a site. Empty categories are dropped.
    pub fn unmark(&self, category: &str, site_id: &str) -> anyhow::Result<bool> {
        let mut sets = self.load()?;
        let Some(set) = sets.get_mut(category) else {
            return Ok(false);
        };
        let removed = set.remove(site_id);
        if set.is_empty() {
            sets.remove(category);
        }
        if removed {
            self.save(&sets)?;
        }
        Ok(removed)
    }
}

impl FavoriteSource for MarkerFile {
    fn marker_sets(&self) -> anyhow::Result<MarkerSets> {
        self.load()
    }
}

/// Flatten every category's markers, ordered by category then site id, and
/// keep the first `cap`. Unreadable markers produce an empty list.
pub fn list_favorites(source: &dyn FavoriteSource, cap: usize) -> Vec<FavoriteEntry> {
    let sets = match source.marker_sets() {
        Ok(sets) => sets,
        Err(e) => {
            tracing::warn!("failed to read favorite markers: {e}");
            return Vec::new();
        }
    };
    sets.iter()
        .flat_map(|(category, ids)| ids.iter().map(move |id| FavoriteEntry::new(category, id)))
        .take(cap)
        .collect()
}
