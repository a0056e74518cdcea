// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Record store boundary
//!
//! The persistent store is an external collaborator (NOR flash behind a
//! driver on the real wearable). The log only needs offset-addressed
//! writes, reads, and a full erase; anything smarter lives behind this
//! trait. Store calls may block on underlying I/O; callers tolerate bounded
//! latency and never retry in a loop.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use thiserror::Error;

/// Default capacity, sized like the wearable's 4 MiB external NOR flash.
pub const DEFAULT_CAPACITY: u32 = 4 * 1024 * 1024;

/// Storage error types.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Access of {len} bytes at offset {offset} is out of bounds")]
    OutOfBounds { offset: u32, len: usize },

    #[error("Store is full")]
    Full,

    #[error("Record truncated: {0} bytes")]
    TruncatedRecord(usize),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),
}

/// Append-target storage collaborator.
pub trait RecordStore {
    /// Writes `data` at the given byte offset.
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), StorageError>;

    /// Reads `buf.len()` bytes from the given byte offset.
    fn read(&self, offset: u32, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Erases the entire store.
    fn erase_all(&mut self) -> Result<(), StorageError>;

    /// Total writable size in bytes.
    fn capacity(&self) -> u32;
}

/// In-memory store, for tests and hosts without persistent media.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    data: Vec<u8>,
    capacity: u32,
}

impl MemoryStore {
    /// Creates a store with the default flash-chip capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a store with an explicit capacity.
    pub fn with_capacity(capacity: u32) -> Self {
        MemoryStore {
            data: Vec::new(),
            capacity,
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), StorageError> {
        let end = offset as usize + data.len();
        if end > self.capacity as usize {
            return Err(StorageError::OutOfBounds {
                offset,
                len: data.len(),
            });
        }
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[offset as usize..end].copy_from_slice(data);
        Ok(())
    }

    fn read(&self, offset: u32, buf: &mut [u8]) -> Result<(), StorageError> {
        let end = offset as usize + buf.len();
        if end > self.data.len() {
            return Err(StorageError::OutOfBounds {
                offset,
                len: buf.len(),
            });
        }
        buf.copy_from_slice(&self.data[offset as usize..end]);
        Ok(())
    }

    fn erase_all(&mut self) -> Result<(), StorageError> {
        self.data.clear();
        Ok(())
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// File-backed store for desktop hosts and long-running simulations.
#[derive(Debug)]
pub struct FileStore {
    file: File,
    capacity: u32,
}

impl FileStore {
    /// Opens (or creates) a store file with the default capacity.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Self::open_with_capacity(path, DEFAULT_CAPACITY)
    }

    /// Opens (or creates) a store file with an explicit capacity.
    pub fn open_with_capacity<P: AsRef<Path>>(
        path: P,
        capacity: u32,
    ) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(FileStore { file, capacity })
    }
}

impl RecordStore for FileStore {
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), StorageError> {
        let end = offset as usize + data.len();
        if end > self.capacity as usize {
            return Err(StorageError::OutOfBounds {
                offset,
                len: data.len(),
            });
        }
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(data)?;
        self.file.flush()?;
        Ok(())
    }

    fn read(&self, offset: u32, buf: &mut [u8]) -> Result<(), StorageError> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn erase_all(&mut self) -> Result<(), StorageError> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }
}
