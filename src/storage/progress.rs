//! Saved ride progress: a directory of JSON snapshots.
//!
//! `index.json` lists snapshot keys most recent first. Saving a new key
//! evicts the oldest snapshots beyond the configured limit.

use crate::route::RouteError;
use crate::simulation::RideSnapshot;
use std::path::{Path, PathBuf};
use thiserror::Error;

const INDEX_FILE: &str = "index.json";

/// Errors from the progress store.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No saved ride with key {0}")]
    NotFound(String),

    #[error("Saved ride is corrupt: {0}")]
    Corrupt(String),

    #[error("Saved route is invalid: {0}")]
    Route(#[from] RouteError),
}

/// Bounded store of ride snapshots.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    dir: PathBuf,
    max_entries: usize,
}

impl ProgressStore {
    /// Open (creating if needed) a store in `dir`.
    pub fn open(dir: impl AsRef<Path>, max_entries: usize) -> Result<Self, ProgressError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            max_entries: max_entries.max(1),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn read_index(&self) -> Result<Vec<String>, ProgressError> {
        let path = self.dir.join(INDEX_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_index(&self, keys: &[String]) -> Result<(), ProgressError> {
        let content = serde_json::to_string(keys)?;
        std::fs::write(self.dir.join(INDEX_FILE), content)?;
        Ok(())
    }

    /// Saved keys, most recent first.
    pub fn list(&self) -> Result<Vec<String>, ProgressError> {
        self.read_index()
    }

    /// Write `snapshot` and move its key to the front. Returns the key.
    pub fn save(&self, snapshot: &RideSnapshot) -> Result<String, ProgressError> {
        let key = snapshot.id.to_string();
        let content = serde_json::to_string(snapshot)?;
        std::fs::write(self.snapshot_path(&key), content)?;

        let mut keys = self.read_index()?;
        keys.retain(|k| k != &key);
        keys.insert(0, key.clone());

        while keys.len() > self.max_entries {
            if let Some(evicted) = keys.pop() {
                tracing::debug!("Evicting saved ride {}", evicted);
                let path = self.snapshot_path(&evicted);
                if path.exists() {
                    std::fs::remove_file(path)?;
                }
            }
        }

        self.write_index(&keys)?;
        Ok(key)
    }

    pub fn load(&self, key: &str) -> Result<RideSnapshot, ProgressError> {
        let path = self.snapshot_path(key);
        if !path.exists() {
            return Err(ProgressError::NotFound(key.to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Mark `key` as most recently used.
    pub fn touch(&self, key: &str) -> Result<(), ProgressError> {
        let mut keys = self.read_index()?;
        if !keys.iter().any(|k| k == key) {
            return Err(ProgressError::NotFound(key.to_string()));
        }
        keys.retain(|k| k != key);
        keys.insert(0, key.to_string());
        self.write_index(&keys)
    }

    /// Delete a saved ride. Removing a missing key is not an error.
    pub fn remove(&self, key: &str) -> Result<(), ProgressError> {
        let path = self.snapshot_path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }

        let mut keys = self.read_index()?;
        keys.retain(|k| k != key);
        self.write_index(&keys)
    }
}
