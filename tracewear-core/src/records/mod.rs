// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Exposure Record Persistence
//!
//! Fixed-layout observation records, the append-only exposure event log,
//! and the storage collaborator boundary.

pub mod log;
pub mod record;
pub mod store;

pub use log::ExposureLog;
pub use record::{EnsRecord, RECORD_SIZE, SEQUENCE_MAX, TX_POWER_UNKNOWN};
pub use store::{FileStore, MemoryStore, RecordStore, StorageError, DEFAULT_CAPACITY};
