//! Local cache of a user's workout entries.
//!
//! Each entry lives in `<work_dir>/<user>/<id>.json`. `index.json` holds the
//! sorted list of cached ids and is rewritten by the commands that change the
//! cache, once per run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::paths;

const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Fields this tool does not interpret, kept as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Shape of an exported stream: either a bare array or `{"entries": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum Export {
    Bare(Vec<Entry>),
    Wrapped { entries: Vec<Entry> },
}

impl Export {
    pub fn into_entries(self) -> Vec<Entry> {
        match self {
            Export::Bare(entries) | Export::Wrapped { entries } => entries,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntryStore {
    dir: PathBuf,
}

impl EntryStore {
    /// Open the cache for `user`, creating its directory if needed.
    pub fn open(work_dir: &Path, user: &str) -> Result<Self> {
        let dir = paths::user_dir(work_dir, user)?;
        paths::ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    pub fn put(&self, entry: &Entry) -> Result<()> {
        let path = self.entry_path(entry.id);
        let json = serde_json::to_string_pretty(entry)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write entry {}", entry.id))
    }

    pub fn get(&self, id: u64) -> Result<Option<Entry>> {
        let path = self.entry_path(id);
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("failed to read entry {}", id)),
        };
        let entry = serde_json::from_str(&contents)
            .with_context(|| format!("entry {} is corrupt", id))?;
        Ok(Some(entry))
    }

    /// Delete entry `id`. Returns `false` if it was not cached.
    pub fn remove(&self, id: u64) -> Result<bool> {
        match std::fs::remove_file(self.entry_path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("failed to remove entry {}", id)),
        }
    }

    /// Ids of every cached entry, ascending.
    pub fn ids(&self) -> Result<Vec<u64>> {
        let mut ids = Vec::new();
        let read_dir = std::fs::read_dir(&self.dir)
            .with_context(|| format!("failed to list {}", self.dir.display()))?;
        for dirent in read_dir {
            let path = dirent?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Every cached entry, ordered by id.
    pub fn list(&self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for id in self.ids()? {
            if let Some(entry) = self.get(id)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    pub fn write_index(&self) -> Result<()> {
        let ids = self.ids()?;
        let path = self.dir.join(INDEX_FILE);
        std::fs::write(&path, serde_json::to_string(&ids)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(count = ids.len(), "rewrote entry index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(id: u64, message: &str) -> Entry {
        Entry {
            id,
            at: None,
            message: Some(message.to_string()),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn open_creates_user_dir() {
        let tmp = TempDir::new().unwrap();
        let store = EntryStore::open(tmp.path(), "alice").unwrap();
        assert!(store.dir().is_dir());
        assert_eq!(store.dir(), tmp.path().join("alice"));
    }

    #[test]
    fn put_get_remove() {
        let tmp = TempDir::new().unwrap();
        let store = EntryStore::open(tmp.path(), "alice").unwrap();

        store.put(&entry(7, "easy 5k")).unwrap();
        assert_eq!(store.get(7).unwrap().unwrap().message.as_deref(), Some("easy 5k"));

        assert!(store.remove(7).unwrap());
        assert!(!store.remove(7).unwrap());
        assert!(store.get(7).unwrap().is_none());
    }

    #[test]
    fn list_is_sorted_and_skips_index() {
        let tmp = TempDir::new().unwrap();
        let store = EntryStore::open(tmp.path(), "alice").unwrap();
        for id in [30, 4, 12] {
            store.put(&entry(id, "run")).unwrap();
        }
        store.write_index().unwrap();

        let ids: Vec<u64> = store.list().unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![4, 12, 30]);

        let index = std::fs::read_to_string(store.dir().join("index.json")).unwrap();
        assert_eq!(index, "[4,12,30]");
    }

    #[test]
    fn unknown_fields_survive() {
        let tmp = TempDir::new().unwrap();
        let store = EntryStore::open(tmp.path(), "alice").unwrap();
        let e: Entry = serde_json::from_str(
            r#"{"id": 1, "message": "hills", "workout": {"activity_type": "Running"}}"#,
        )
        .unwrap();
        store.put(&e).unwrap();

        let back = store.get(1).unwrap().unwrap();
        assert_eq!(back.extra["workout"]["activity_type"], "Running");
    }

    #[test]
    fn export_accepts_both_shapes() {
        let bare: Export = serde_json::from_str(r#"[{"id": 1}, {"id": 2}]"#).unwrap();
        assert_eq!(bare.into_entries().len(), 2);

        let wrapped: Export =
            serde_json::from_str(r#"{"entries": [{"id": 3, "message": "swim"}]}"#).unwrap();
        let entries = wrapped.into_entries();
        assert_eq!(entries[0].id, 3);
    }
}
