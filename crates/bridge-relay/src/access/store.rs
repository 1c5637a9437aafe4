//! Dynamic allow-list store with write-through JSON persistence.
//!
//! The in-memory set is the source of truth for the running process; the
//! settings file is best-effort mirroring. Persistence is read-merge-write so
//! fields owned by other features (`workDir`, anything unknown) survive
//! allow-list mutations.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::error::StoreError;

/// On-disk settings layout shared with the admin surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDocument {
    pub whitelist: Vec<String>,
    #[serde(rename = "workDir", skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Operator-maintained allow-list entries, persisted on every mutation.
pub struct AllowListStore {
    path: PathBuf,
    entries: RwLock<BTreeSet<String>>,
}

impl AllowListStore {
    /// Load the store from `path`. Any read or parse failure starts the
    /// process with an empty set; startup never fails here.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read_document(&path) {
            Ok(doc) => {
                info!(
                    path = %path.display(),
                    entries = doc.whitelist.len(),
                    "loaded allow-list"
                );
                doc.whitelist.into_iter().collect()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "starting with empty allow-list");
                BTreeSet::new()
            }
        };

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    /// Add an entry. Idempotent for entries already present. The entry is
    /// inserted before persisting; a persistence failure leaves the mutation
    /// in place and surfaces as `Err`.
    pub fn add(&self, entry: &str) -> Result<Vec<String>, StoreError> {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(StoreError::EmptyEntry);
        }

        self.entries.write().insert(entry.to_string());
        self.persist()?;
        Ok(self.snapshot())
    }

    /// Remove an entry. Removal of an absent entry is not an error.
    pub fn remove(&self, entry: &str) -> Result<Vec<String>, StoreError> {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(StoreError::EmptyEntry);
        }

        self.entries.write().remove(entry);
        self.persist()?;
        Ok(self.snapshot())
    }

    /// Current entries as a sorted list. Readers concurrent with a mutation
    /// see the pre- or post-mutation set, never a partial one.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.read().iter().cloned().collect()
    }

    /// Working-directory value from the settings file, if set.
    pub fn work_dir(&self) -> Option<String> {
        Self::read_document(&self.path).ok().and_then(|doc| doc.work_dir)
    }

    /// Set the working-directory value, preserving the allow-list and any
    /// unknown fields in the document.
    pub fn set_work_dir(&self, dir: &str) -> Result<(), StoreError> {
        let dir = dir.trim();
        if dir.is_empty() {
            return Err(StoreError::EmptyEntry);
        }

        let mut doc = Self::read_document(&self.path).unwrap_or_default();
        doc.work_dir = Some(dir.to_string());
        doc.whitelist = self.snapshot();
        self.write_document(&doc)
    }

    fn persist(&self) -> Result<(), StoreError> {
        // Re-read before writing so unrelated fields are merged, not clobbered.
        let mut doc = Self::read_document(&self.path).unwrap_or_default();
        doc.whitelist = self.snapshot();
        self.write_document(&doc)
    }

    fn read_document(path: &Path) -> Result<SettingsDocument, StoreError> {
        let body = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn write_document(&self, doc: &SettingsDocument) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(doc)?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }
}
