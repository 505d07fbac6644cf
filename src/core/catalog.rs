use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// A catalog entry as stored on disk.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub name: String,
    pub popularity_score: f64,
    pub weight: f64,
    #[serde(default)]
    pub images: BTreeMap<String, String>,
}

/// Read-only JSON array of [`ItemRecord`]s, re-read on every call.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the current item set. A missing, malformed or empty file all
    /// yield an empty vector.
    pub fn load_items(&self) -> Vec<ItemRecord> {
        match self.try_load() {
            Ok(items) => {
                debug!(count = items.len(), path = %self.path.display(), "Loaded catalog");
                items
            }
            Err(e) => {
                error!(error = %e, path = %self.path.display(), "Error loading catalog");
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> anyhow::Result<Vec<ItemRecord>> {
        use anyhow::Context;

        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read catalog file: {}", self.path.display()))?;
        let items: Vec<ItemRecord> = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse catalog file: {}", self.path.display()))?;
        if items.is_empty() {
            anyhow::bail!("Catalog file contains no items");
        }
        Ok(items)
    }
}
