//! The persisted export index.
//!
//! The index is the durable record of what has already been exported to a
//! target directory: for each remote item identity, the fingerprint that was
//! last exported, the output file it was written to, and when. It lives as
//! `index.toml` inside the export target so the whole directory (notes plus
//! index) can be committed to version control as one unit.
//!
//! Entries are never deleted automatically: the tool's job is archival, so
//! an item that disappears from the remote library keeps its entry and its
//! exported file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sync::file::atomic_write;

/// Well-known index file name inside an export target directory.
pub const INDEX_FILE_NAME: &str = "index.toml";

/// Persisted state for one exported item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Fingerprint of the remote metadata at the time of the last export.
    pub fingerprint: String,
    /// Output file, relative to the export target directory.
    pub path: String,
    /// RFC 2822 timestamp of the last successful export.
    pub exported_at: String,
}

/// On-disk shape of the index file.
///
/// A `BTreeMap` keyed by item identity keeps the serialized TOML sorted,
/// which keeps diffs stable under version control.
#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    #[serde(default)]
    items: BTreeMap<String, IndexEntry>,
}

/// In-memory export index for one target directory.
///
/// Owned exclusively by one export run at a time; concurrent runs against
/// the same target are a caller error (no lock is taken).
#[derive(Debug, Default)]
pub struct ExportIndex {
    items: BTreeMap<String, IndexEntry>,
    dirty: bool,
}

impl ExportIndex {
    /// Load the index from a target export directory.
    ///
    /// A missing index file yields an empty index (first run). A present but
    /// unparseable file is an error: the index is the record of prior
    /// exports, and silently discarding it would re-export everything and
    /// lose the history of what was written where.
    ///
    /// # Errors
    ///
    /// `Error::IndexCorrupt` if the file exists but cannot be parsed;
    /// `Error::Io` if it cannot be read.
    pub fn load(target_dir: &Path) -> Result<Self> {
        let path = Self::file_path(target_dir);
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)?;
        let file: IndexFile = toml::from_str(&raw).map_err(|e| Error::IndexCorrupt {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            items: file.items,
            dirty: false,
        })
    }

    /// Path of the index file under a target directory.
    #[must_use]
    pub fn file_path(target_dir: &Path) -> PathBuf {
        target_dir.join(INDEX_FILE_NAME)
    }

    /// Look up the entry for an item identity.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<&IndexEntry> {
        self.items.get(id)
    }

    /// Insert or replace the entry for an identity.
    ///
    /// Marks the index dirty; does not persist. The caller is expected to
    /// checkpoint with [`ExportIndex::persist`] after the corresponding
    /// output file has been durably written.
    pub fn record(&mut self, id: String, entry: IndexEntry) {
        self.items.insert(id, entry);
        self.dirty = true;
    }

    /// Number of indexed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether there are recorded changes not yet persisted.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Persist the index to the target directory, atomically.
    ///
    /// Safe to call repeatedly during a run (checkpointing after each item)
    /// as well as once at the end. A crash during persist leaves either the
    /// previous index or the new one on disk, never a truncated file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the atomic write fails; the
    /// in-memory state keeps its dirty flag in that case.
    pub fn persist(&mut self, target_dir: &Path) -> Result<()> {
        let file = IndexFile {
            items: self.items.clone(),
        };
        let content = toml::to_string(&file)?;
        atomic_write(&Self::file_path(target_dir), &content)?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(fingerprint: &str, path: &str) -> IndexEntry {
        IndexEntry {
            fingerprint: fingerprint.into(),
            path: path.into(),
            exported_at: "Wed, 26 Jan 2022 21:15:25 +0800".into(),
        }
    }

    #[test]
    fn test_load_missing_returns_empty() {
        let temp_dir = TempDir::new().unwrap();
        let index = ExportIndex::load(temp_dir.path()).unwrap();
        assert!(index.is_empty());
        assert!(!index.is_dirty());
    }

    #[test]
    fn test_record_and_roundtrip() {
        let temp_dir = TempDir::new().unwrap();

        let mut index = ExportIndex::load(temp_dir.path()).unwrap();
        index.record("B001".into(), entry("abc", "Title A.md"));
        index.record("B002".into(), entry("def", "Title B.md"));
        assert!(index.is_dirty());

        index.persist(temp_dir.path()).unwrap();
        assert!(!index.is_dirty());

        let reloaded = ExportIndex::load(temp_dir.path()).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.lookup("B001").unwrap().fingerprint, "abc");
        assert_eq!(reloaded.lookup("B002").unwrap().path, "Title B.md");
        assert!(reloaded.lookup("B003").is_none());
    }

    #[test]
    fn test_record_replaces_existing_entry() {
        let mut index = ExportIndex::default();
        index.record("B001".into(), entry("old", "Old.md"));
        index.record("B001".into(), entry("new", "New.md"));

        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("B001").unwrap().fingerprint, "new");
    }

    #[test]
    fn test_corrupt_index_is_an_error_not_a_reset() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(ExportIndex::file_path(temp_dir.path()), "items = not toml [").unwrap();

        let result = ExportIndex::load(temp_dir.path());
        assert!(matches!(result, Err(Error::IndexCorrupt { .. })));
    }

    #[test]
    fn test_persist_is_repeatable() {
        let temp_dir = TempDir::new().unwrap();
        let mut index = ExportIndex::default();

        index.record("B001".into(), entry("a", "A.md"));
        index.persist(temp_dir.path()).unwrap();

        index.record("B002".into(), entry("b", "B.md"));
        index.persist(temp_dir.path()).unwrap();

        let reloaded = ExportIndex::load(temp_dir.path()).unwrap();
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn test_failed_persist_leaves_previous_state_loadable() {
        let temp_dir = TempDir::new().unwrap();
        let mut index = ExportIndex::default();
        index.record("B001".into(), entry("a", "A.md"));
        index.persist(temp_dir.path()).unwrap();

        // Force the next persist to fail: replace the target dir path with
        // a file so the rename target's parent is invalid.
        let blocked = temp_dir.path().join("blocked");
        fs::write(&blocked, "file, not a dir").unwrap();
        index.record("B002".into(), entry("b", "B.md"));
        assert!(index.persist(&blocked).is_err());

        // The original index is still fully loadable.
        let reloaded = ExportIndex::load(temp_dir.path()).unwrap();
        assert_eq!(reloaded.len(), 1);
    }
}
