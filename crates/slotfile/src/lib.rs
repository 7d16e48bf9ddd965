//! # Slotfile — fixed-stride record slots
//!
//! The data file of one table in the carlot storage engine: a flat file of
//! equally sized **slots**, each holding exactly one serialized record.
//!
//! ## Slot layout (v1)
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ SLOT n at byte offset n * 501                │
//! │                                              │
//! │ JSON payload (≤ 500 bytes)                   │
//! │ padding: ASCII spaces up to byte 500         │
//! │ terminator: b'\n' (byte 501)                 │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Because every slot is exactly [`STRIDE`] bytes, a slot number converts to
//! an exact byte offset and records can be read or overwritten in place
//! without scanning the file. A record whose JSON form exceeds
//! [`MAX_PAYLOAD`] bytes is rejected with [`SlotError::Oversize`] before any
//! byte reaches the file; writing it anyway would bleed into the next slot
//! and corrupt its neighbor.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum serialized record size, in bytes.
pub const MAX_PAYLOAD: usize = 500;

/// Byte used to right-pad payloads shorter than [`MAX_PAYLOAD`].
pub const PADDING: u8 = b' ';

/// Byte closing every slot.
pub const TERMINATOR: u8 = b'\n';

/// Total slot size: payload + terminator.
pub const STRIDE: u64 = MAX_PAYLOAD as u64 + 1;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("record too large for slot: {len} bytes (max {MAX_PAYLOAD})")]
    Oversize { len: usize },
    #[error("malformed slot payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encodes a record into exactly one slot of [`STRIDE`] bytes.
///
/// The record is serialized to JSON, right-padded with spaces to
/// [`MAX_PAYLOAD`] bytes, and closed with the terminator byte.
///
/// # Errors
///
/// [`SlotError::Oversize`] if the serialized record does not fit in one
/// payload; [`SlotError::Malformed`] if serialization itself fails.
pub fn encode_slot<R: Serialize>(record: &R) -> Result<Vec<u8>, SlotError> {
    let mut payload = serde_json::to_vec(record)?;
    if payload.len() > MAX_PAYLOAD {
        return Err(SlotError::Oversize { len: payload.len() });
    }
    payload.resize(MAX_PAYLOAD, PADDING);
    payload.push(TERMINATOR);
    Ok(payload)
}

/// Decodes one slot's bytes back into a record.
///
/// Trailing padding and the terminator are stripped before parsing. The
/// payload is JSON, so padding can never be confused with record content.
pub fn decode_slot<R: DeserializeOwned>(buf: &[u8]) -> Result<R, SlotError> {
    let end = buf
        .iter()
        .rposition(|&b| b != PADDING && b != TERMINATOR)
        .map_or(0, |i| i + 1);
    Ok(serde_json::from_slice(&buf[..end])?)
}

/// One table's data file, addressed by slot number.
///
/// The file handle is not kept open between calls: each read or write
/// opens the file, seeks to `slot * STRIDE`, performs the operation, and
/// closes the handle. This keeps ownership simple and avoids long-lived
/// file descriptors.
pub struct SlotFile {
    path: PathBuf,
}

impl SlotFile {
    /// Opens the data file at `path`, creating it empty if absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SlotError> {
        let path = path.as_ref().to_path_buf();
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path })
    }

    /// Writes `record` into slot `slot`, overwriting whatever was there.
    ///
    /// Encoding (and hence the oversize check) happens before the file is
    /// opened, so a record that does not fit leaves the file untouched.
    /// Writing slot `n` on a file of exactly `n` slots appends.
    pub fn write_slot<R: Serialize>(&self, slot: u64, record: &R) -> Result<(), SlotError> {
        let bytes = encode_slot(record)?;
        let mut f = OpenOptions::new().read(true).write(true).open(&self.path)?;
        f.seek(SeekFrom::Start(slot * STRIDE))?;
        f.write_all(&bytes)?;
        f.flush()?;
        Ok(())
    }

    /// Reads and decodes the record in slot `slot`.
    ///
    /// # Errors
    ///
    /// I/O errors (including a seek past the end of the file) and malformed
    /// payloads are propagated; resolving a valid slot number is the
    /// caller's job; the index owns that mapping.
    pub fn read_slot<R: DeserializeOwned>(&self, slot: u64) -> Result<R, SlotError> {
        let mut f = File::open(&self.path)?;
        f.seek(SeekFrom::Start(slot * STRIDE))?;
        let mut buf = vec![0u8; STRIDE as usize];
        f.read_exact(&mut buf)?;
        decode_slot(&buf)
    }

    /// Number of whole slots physically present in the file.
    ///
    /// This counts orphaned slots too, so it is the next free slot number
    /// for an append.
    pub fn slot_count(&self) -> Result<u64, SlotError> {
        Ok(std::fs::metadata(&self.path)?.len() / STRIDE)
    }

    /// Path of the underlying data file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
