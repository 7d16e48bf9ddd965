//! # Lineindex — persistent key → slot mapping
//!
//! The index file of one table in the carlot storage engine. It maps each
//! logical key to the slot number holding its record, so lookups resolve to
//! an exact byte offset instead of scanning the data file.
//!
//! The whole index lives in memory as a list of `(key, slot)` pairs kept
//! sorted ascending by key, and is persisted as a single JSON document (an
//! array of `[key, slot]` pairs) rewritten wholesale on every mutation.
//! Index documents are expected to stay small relative to data files, so
//! the write amplification is an accepted trade for simplicity.
//!
//! Slot numbers are assigned in append order and never reused: removing an
//! entry orphans its slot, it does not free it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("index document serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Ordered key → slot mapping for one table, mirrored to a JSON document.
///
/// Lookups are linear first-match scans. Entries are kept sorted by key, so
/// "entry order" and "key order" coincide; first-match semantics are what
/// matters if a duplicate key ever sneaks in through a bug.
#[derive(Debug)]
pub struct LineIndex<K> {
    path: PathBuf,
    entries: Vec<(K, u64)>,
}

impl<K> LineIndex<K>
where
    K: Ord + Clone + Serialize + DeserializeOwned,
{
    /// Loads the index document at `path`, creating the file if absent.
    ///
    /// A missing, empty, or unparseable document yields an **empty** index
    /// rather than an error; a freshly created table legitimately has no
    /// entries yet, and bootstrap touches the file before first use.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let path = path.as_ref().to_path_buf();
        OpenOptions::new().create(true).append(true).open(&path)?;
        let raw = std::fs::read(&path)?;
        let entries = serde_json::from_slice(&raw).unwrap_or_default();
        Ok(Self { path, entries })
    }

    /// Resolves `key` to its slot number, first match in entry order.
    ///
    /// Absence is a normal result, not an error.
    pub fn lookup(&self, key: &K) -> Option<u64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, slot)| *slot)
    }

    /// Registers `key → slot` unless the key is already present.
    ///
    /// Returns `true` if the entry was added (and the document rewritten),
    /// `false` for the idempotent no-op on an existing key.
    pub fn insert_if_absent(&mut self, key: K, slot: u64) -> Result<bool, IndexError> {
        if self.lookup(&key).is_some() {
            return Ok(false);
        }
        self.entries.push((key, slot));
        self.persist()?;
        Ok(true)
    }

    /// Rewrites the key of the first entry matching `old`, keeping its slot.
    ///
    /// Returns `false` (without touching the document) if no entry matches.
    pub fn rename(&mut self, old: &K, new: K) -> Result<bool, IndexError> {
        match self.entries.iter_mut().find(|(k, _)| *k == *old) {
            Some(entry) => {
                entry.0 = new;
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the first entry matching `key`, returning its slot number.
    ///
    /// The slot itself stays allocated in the data file (orphaned).
    pub fn remove(&mut self, key: &K) -> Result<Option<u64>, IndexError> {
        match self.entries.iter().position(|(k, _)| k == key) {
            Some(i) => {
                let (_, slot) = self.entries.remove(i);
                self.persist()?;
                Ok(Some(slot))
            }
            None => Ok(None),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in ascending key order.
    pub fn entries(&self) -> &[(K, u64)] {
        &self.entries
    }

    /// Sorts by key and rewrites the whole document.
    fn persist(&mut self) -> Result<(), IndexError> {
        self.entries.sort();
        let doc = serde_json::to_vec(&self.entries)?;
        std::fs::write(&self.path, doc)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    // ---------------------- Load semantics ----------------------

    #[test]
    fn load_missing_file_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let idx: LineIndex<String> = LineIndex::load(dir.path().join("idx.txt"))?;
        assert!(idx.is_empty());
        Ok(())
    }

    #[test]
    fn load_malformed_document_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("idx.txt");
        std::fs::write(&path, b"{not json!")?;

        let idx: LineIndex<String> = LineIndex::load(&path)?;
        assert!(idx.is_empty());
        Ok(())
    }

    #[test]
    fn load_roundtrips_persisted_entries() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("idx.txt");

        {
            let mut idx: LineIndex<String> = LineIndex::load(&path)?;
            idx.insert_if_absent("b".into(), 0)?;
            idx.insert_if_absent("a".into(), 1)?;
        }

        let idx: LineIndex<String> = LineIndex::load(&path)?;
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.lookup(&"b".to_string()), Some(0));
        assert_eq!(idx.lookup(&"a".to_string()), Some(1));
        Ok(())
    }

    // ---------------------- Document format ----------------------

    #[test]
    fn document_is_sorted_json_pairs() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("idx.txt");

        let mut idx: LineIndex<String> = LineIndex::load(&path)?;
        idx.insert_if_absent("zeta".into(), 0)?;
        idx.insert_if_absent("alpha".into(), 1)?;

        let raw = std::fs::read_to_string(&path)?;
        assert_eq!(raw, r#"[["alpha",1],["zeta",0]]"#);
        Ok(())
    }

    #[test]
    fn integer_keys_supported() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("idx.txt");

        let mut idx: LineIndex<i64> = LineIndex::load(&path)?;
        idx.insert_if_absent(10, 0)?;
        idx.insert_if_absent(2, 1)?;

        let raw = std::fs::read_to_string(&path)?;
        assert_eq!(raw, r#"[[2,1],[10,0]]"#);
        assert_eq!(idx.lookup(&10), Some(0));
        Ok(())
    }

    // ---------------------- Mutations ----------------------

    #[test]
    fn insert_if_absent_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let mut idx: LineIndex<String> = LineIndex::load(dir.path().join("idx.txt"))?;

        assert!(idx.insert_if_absent("k".into(), 0)?);
        assert!(!idx.insert_if_absent("k".into(), 7)?);

        assert_eq!(idx.len(), 1);
        assert_eq!(idx.lookup(&"k".to_string()), Some(0));
        Ok(())
    }

    #[test]
    fn rename_preserves_slot() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("idx.txt");
        let mut idx: LineIndex<String> = LineIndex::load(&path)?;
        idx.insert_if_absent("old".into(), 3)?;

        assert!(idx.rename(&"old".to_string(), "new".into())?);
        assert_eq!(idx.lookup(&"old".to_string()), None);
        assert_eq!(idx.lookup(&"new".to_string()), Some(3));

        // Survives reload.
        let idx: LineIndex<String> = LineIndex::load(&path)?;
        assert_eq!(idx.lookup(&"new".to_string()), Some(3));
        Ok(())
    }

    #[test]
    fn rename_missing_key_is_noop() -> Result<()> {
        let dir = tempdir()?;
        let mut idx: LineIndex<String> = LineIndex::load(dir.path().join("idx.txt"))?;
        idx.insert_if_absent("k".into(), 0)?;

        assert!(!idx.rename(&"ghost".to_string(), "new".into())?);
        assert_eq!(idx.len(), 1);
        Ok(())
    }

    #[test]
    fn remove_returns_slot_and_persists() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("idx.txt");
        let mut idx: LineIndex<String> = LineIndex::load(&path)?;
        idx.insert_if_absent("a".into(), 0)?;
        idx.insert_if_absent("b".into(), 1)?;

        assert_eq!(idx.remove(&"a".to_string())?, Some(0));
        assert_eq!(idx.remove(&"a".to_string())?, None);

        let idx: LineIndex<String> = LineIndex::load(&path)?;
        assert_eq!(idx.len(), 1);
        // Slot 1 still points where it always did; slots are never renumbered.
        assert_eq!(idx.lookup(&"b".to_string()), Some(1));
        Ok(())
    }

    #[test]
    fn entries_are_in_key_order() -> Result<()> {
        let dir = tempdir()?;
        let mut idx: LineIndex<String> = LineIndex::load(dir.path().join("idx.txt"))?;
        idx.insert_if_absent("m".into(), 0)?;
        idx.insert_if_absent("a".into(), 1)?;
        idx.insert_if_absent("z".into(), 2)?;

        let keys: Vec<_> = idx.entries().iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec!["a".to_string(), "m".into(), "z".into()]);
        Ok(())
    }
}
