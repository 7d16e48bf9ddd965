//! # Rectable — one record type, one data file, one index file
//!
//! A [`RecordTable`] pairs a [`slotfile::SlotFile`] with a
//! [`lineindex::LineIndex`] to store records of a single schema. The index
//! resolves a logical key to a slot number; the slot file turns that into an
//! exact byte offset. The table itself never scans the data file to find a
//! key.
//!
//! ## Write path
//!
//! 1. [`put_if_new`](RecordTable::put_if_new) assigns slot = current index
//!    size, so records land in arrival order and slots are never reused.
//! 2. The encoded record is written to its slot **before** the index entry
//!    is registered. A failed write can orphan a slot, but the index never
//!    points at a slot that was not written.
//!
//! ## Read path
//!
//! 1. Resolve the key through the in-memory index (absence is `None`).
//! 2. Seek to `slot * STRIDE`, read one stride, decode.

use lineindex::{IndexError, LineIndex};
use serde::de::DeserializeOwned;
use serde::Serialize;
use slotfile::{SlotError, SlotFile};
use std::path::Path;
use thiserror::Error;

/// A storable record schema: serializable, and able to name its own key.
pub trait Record: Serialize + DeserializeOwned {
    /// Logical key type (unique within one table).
    type Key: Ord + Clone + Serialize + DeserializeOwned;

    /// The record's current key value.
    fn key(&self) -> Self::Key;
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// A single-schema table over one data file and one index file.
///
/// All mutation goes through `&mut self`, which keeps the table
/// single-writer within safe Rust; nothing here locks the files against
/// other processes.
pub struct RecordTable<R: Record> {
    slots: SlotFile,
    index: LineIndex<R::Key>,
}

impl<R: Record> RecordTable<R> {
    /// Opens a table, creating both files empty if absent and loading the
    /// index into memory.
    pub fn open<P: AsRef<Path>>(data_path: P, index_path: P) -> Result<Self, TableError> {
        Ok(Self {
            slots: SlotFile::open(data_path)?,
            index: LineIndex::load(index_path)?,
        })
    }

    /// Fetches the record stored under `key`, or `None` if the key is not
    /// indexed.
    pub fn get(&self, key: &R::Key) -> Result<Option<R>, TableError> {
        match self.index.lookup(key) {
            Some(slot) => Ok(Some(self.slots.read_slot(slot)?)),
            None => Ok(None),
        }
    }

    /// Returns `true` if `key` is present in the index.
    pub fn contains(&self, key: &R::Key) -> bool {
        self.index.lookup(key).is_some()
    }

    /// Inserts `record` unless its key already exists (first write wins).
    ///
    /// On a duplicate key nothing is written and the **already-stored**
    /// record is returned, not the argument. Otherwise the record takes the
    /// next slot in arrival order and its index entry is registered.
    pub fn put_if_new(&mut self, record: R) -> Result<R, TableError> {
        let key = record.key();
        if let Some(slot) = self.index.lookup(&key) {
            return Ok(self.slots.read_slot(slot)?);
        }
        // Next slot comes from the physical file, not the index size, so a
        // removed entry's orphaned slot is never handed out again.
        let slot = self.slots.slot_count()?;
        self.slots.write_slot(slot, &record)?;
        self.index.insert_if_absent(key, slot)?;
        Ok(record)
    }

    /// Overwrites the record stored under `key` at its existing slot.
    ///
    /// The slot number is invariant across updates; that is the point of
    /// fixed-stride slots. Returns `None` if the key is not indexed.
    pub fn update_in_place(&mut self, key: &R::Key, record: R) -> Result<Option<R>, TableError> {
        match self.index.lookup(key) {
            Some(slot) => {
                self.slots.write_slot(slot, &record)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Replaces the record under `old_key` with `record` (carrying the new
    /// key) at the unchanged slot, then renames the index entry.
    ///
    /// Payload and index key change together: the record is encoded (and
    /// the oversize check runs) before either file is touched, so a record
    /// that cannot be stored leaves both consistent. Returns `None` if
    /// `old_key` is not indexed.
    pub fn rekey(&mut self, old_key: &R::Key, record: R) -> Result<Option<R>, TableError> {
        let Some(slot) = self.index.lookup(old_key) else {
            return Ok(None);
        };
        self.slots.write_slot(slot, &record)?;
        self.index.rename(old_key, record.key())?;
        Ok(Some(record))
    }

    /// Drops the index entry for `key`. The data slot stays allocated
    /// (orphaned) and its number is never reused.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove(&mut self, key: &R::Key) -> Result<bool, TableError> {
        Ok(self.index.remove(key)?.is_some())
    }

    /// Number of live (indexed) records.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Lazily reads every live record in **slot order** (arrival order).
    /// Orphaned slots are skipped: only slots the index still references
    /// are read. Restartable: each call walks the index snapshot anew.
    pub fn scan(&self) -> impl Iterator<Item = Result<R, TableError>> + '_ {
        let mut slots: Vec<u64> = self.index.entries().iter().map(|(_, s)| *s).collect();
        slots.sort_unstable();
        slots
            .into_iter()
            .map(move |slot| self.slots.read_slot(slot).map_err(TableError::from))
    }

    /// Lazily reads every indexed record in **ascending key order**.
    pub fn scan_by_key(&self) -> impl Iterator<Item = Result<R, TableError>> + '_ {
        self.index
            .entries()
            .iter()
            .map(move |(_, slot)| self.slots.read_slot(*slot).map_err(TableError::from))
    }
}
