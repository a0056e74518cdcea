// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Exposure event log
//!
//! Append-only log of observed advertisements. The log is the sole owner of
//! the 24-bit sequence counter and the write offset; both advance only on
//! the ingestion path, and only after the store write has landed, so the
//! persisted stream never skips a sequence number. There is no per-record
//! delete; the only destructive operation erases everything and resets both
//! counter and offset.

use tracing::{debug, warn};

use super::record::{EnsRecord, RECORD_SIZE, SEQUENCE_MAX};
use super::store::{RecordStore, StorageError};
use crate::crypto::codec::{AEM_LENGTH, RPI_LENGTH};

/// Append-only log of observed identifier/metadata advertisements.
pub struct ExposureLog<S: RecordStore> {
    store: S,
    sequence: u32,
    write_offset: u32,
    paused: bool,
}

impl<S: RecordStore> ExposureLog<S> {
    /// Creates an empty log on top of a store.
    pub fn new(store: S) -> Self {
        ExposureLog {
            store,
            sequence: 0,
            write_offset: 0,
            paused: false,
        }
    }

    /// Restores a log whose counter and offset survived a reboot.
    pub fn resume(store: S, sequence: u32, write_offset: u32) -> Self {
        ExposureLog {
            store,
            sequence: sequence & SEQUENCE_MAX,
            write_offset,
            paused: false,
        }
    }

    /// Packs and appends one observation. Returns the record's byte offset.
    ///
    /// On any failure the counter and offset are left untouched and nothing
    /// is persisted; there is no partial append.
    pub fn append(
        &mut self,
        timestamp: u32,
        rpi: &[u8; RPI_LENGTH],
        aem: &[u8; AEM_LENGTH],
        rssi: i8,
        tx_power: Option<i8>,
    ) -> Result<u32, StorageError> {
        if self.write_offset + RECORD_SIZE as u32 > self.store.capacity() {
            return Err(StorageError::Full);
        }

        let record = EnsRecord {
            sequence: self.sequence,
            timestamp,
            rpi: *rpi,
            aem: *aem,
            rssi,
            tx_power,
        };
        self.store.write(self.write_offset, &record.pack())?;

        // The write landed; only now may counter and offset advance.
        let offset = self.write_offset;
        self.sequence = (self.sequence + 1) & SEQUENCE_MAX;
        self.write_offset += RECORD_SIZE as u32;

        Ok(offset)
    }

    /// Reads the record at a byte offset returned by [`append`](Self::append).
    pub fn read_at(&self, offset: u32) -> Result<EnsRecord, StorageError> {
        let mut buf = [0u8; RECORD_SIZE];
        self.store.read(offset, &mut buf)?;
        EnsRecord::parse(&buf)
    }

    /// Erases the whole store and resets the write offset and the sequence
    /// counter to zero.
    pub fn erase_all(&mut self) -> Result<(), StorageError> {
        self.store.erase_all()?;
        self.write_offset = 0;
        self.sequence = 0;
        debug!("Exposure log erased");
        Ok(())
    }

    /// Ingestion boundary for the scanning collaborator.
    ///
    /// Failure policy: a failed append is logged and the observation is
    /// dropped; there are no retries. Returns the stored record's offset,
    /// or `None` if the observation was dropped.
    pub fn report_observed_identifier(
        &mut self,
        rpi: [u8; RPI_LENGTH],
        aem: [u8; AEM_LENGTH],
        rssi: i8,
        timestamp: u32,
    ) -> Option<u32> {
        if self.paused {
            debug!("Service paused, dropping observed identifier");
            return None;
        }

        match self.append(timestamp, &rpi, &aem, rssi, None) {
            Ok(offset) => {
                debug!(
                    rpi = %hex::encode(&rpi[..4]),
                    rssi,
                    offset,
                    "Logged observed identifier"
                );
                Some(offset)
            }
            Err(err) => {
                warn!(%err, "Failed to log observed identifier, dropping");
                None
            }
        }
    }

    /// Stops/starts accepting observations without touching stored data.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether ingestion is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of records persisted since the last erase.
    pub fn record_count(&self) -> u32 {
        self.write_offset / RECORD_SIZE as u32
    }

    /// Sequence number the next successful append will carry.
    pub fn next_sequence(&self) -> u32 {
        self.sequence
    }

    /// Byte offset the next successful append will write to.
    pub fn write_offset(&self) -> u32 {
        self.write_offset
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the underlying store (host maintenance).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
