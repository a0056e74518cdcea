// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the exposure event log: record round-trips, sequence counter
//! policy, erase semantics, and the storage collaborator boundary.

use tracewear_core::records::{
    EnsRecord, ExposureLog, FileStore, MemoryStore, RecordStore, StorageError, RECORD_SIZE,
    SEQUENCE_MAX,
};

/// Store wrapper whose writes can be made to fail, for exercising the
/// append failure policy.
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: bool,
}

impl FlakyStore {
    fn new() -> Self {
        FlakyStore {
            inner: MemoryStore::new(),
            fail_writes: false,
        }
    }
}

impl RecordStore for FlakyStore {
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Io(std::io::Error::other("simulated flash fault")));
        }
        self.inner.write(offset, data)
    }

    fn read(&self, offset: u32, buf: &mut [u8]) -> Result<(), StorageError> {
        self.inner.read(offset, buf)
    }

    fn erase_all(&mut self) -> Result<(), StorageError> {
        self.inner.erase_all()
    }

    fn capacity(&self) -> u32 {
        self.inner.capacity()
    }
}

// =============================================================================
// Round-trips and sequencing
// =============================================================================

/// Append-then-read reproduces every field of the observation.
#[test]
fn test_append_read_round_trip() {
    let mut log = ExposureLog::new(MemoryStore::new());

    let rpi = [0x42; 16];
    let aem = [0xDE, 0xAD, 0xBE, 0xEF];
    let offset = log.append(1_615_051_437, &rpi, &aem, -67, Some(-12)).unwrap();

    let record = log.read_at(offset).unwrap();
    assert_eq!(record.sequence, 0);
    assert_eq!(record.timestamp, 1_615_051_437);
    assert_eq!(record.rpi, rpi);
    assert_eq!(record.aem, aem);
    assert_eq!(record.rssi, -67);
    assert_eq!(record.tx_power, Some(-12));
}

/// The sequence number increments by exactly one per successful append,
/// and every offset advances by the fixed record size.
#[test]
fn test_sequence_and_offset_advance_per_append() {
    let mut log = ExposureLog::new(MemoryStore::new());

    for i in 0..5u32 {
        let offset = log
            .append(1000 + i, &[i as u8; 16], &[i as u8; 4], -60, None)
            .unwrap();
        assert_eq!(offset, i * RECORD_SIZE as u32);
        assert_eq!(log.read_at(offset).unwrap().sequence, i);
    }
    assert_eq!(log.record_count(), 5);
}

/// The 24-bit counter wraps 0xFFFFFF → 0x000000.
#[test]
fn test_sequence_wraps_to_zero() {
    let mut log = ExposureLog::resume(MemoryStore::new(), SEQUENCE_MAX, 0);

    let at_max = log.append(1, &[1; 16], &[1; 4], -60, None).unwrap();
    let wrapped = log.append(2, &[2; 16], &[2; 4], -60, None).unwrap();

    assert_eq!(log.read_at(at_max).unwrap().sequence, SEQUENCE_MAX);
    assert_eq!(log.read_at(wrapped).unwrap().sequence, 0);
}

// =============================================================================
// Failure policy
// =============================================================================

/// A failed store write leaves the counter and offset untouched: the
/// persisted stream never skips a sequence number.
#[test]
fn test_failed_write_does_not_advance_counter() {
    let mut log = ExposureLog::new(FlakyStore::new());
    log.append(1, &[1; 16], &[1; 4], -60, None).unwrap();

    log.store_mut().fail_writes = true;
    assert!(log.append(2, &[2; 16], &[2; 4], -60, None).is_err());
    assert_eq!(log.next_sequence(), 1);
    assert_eq!(log.write_offset(), RECORD_SIZE as u32);

    // The ingestion boundary drops instead of propagating.
    assert_eq!(log.report_observed_identifier([3; 16], [3; 4], -60, 3), None);
    assert_eq!(log.next_sequence(), 1);

    // Recovery continues the uninterrupted sequence.
    log.store_mut().fail_writes = false;
    let offset = log.append(4, &[4; 16], &[4; 4], -60, None).unwrap();
    assert_eq!(log.read_at(offset).unwrap().sequence, 1);
}

/// A full store rejects the append and drops the observation.
#[test]
fn test_capacity_exhaustion() {
    let store = MemoryStore::with_capacity(2 * RECORD_SIZE as u32);
    let mut log = ExposureLog::new(store);

    assert!(log.report_observed_identifier([1; 16], [1; 4], -60, 1).is_some());
    assert!(log.report_observed_identifier([2; 16], [2; 4], -60, 2).is_some());
    assert_eq!(log.report_observed_identifier([3; 16], [3; 4], -60, 3), None);
    assert_eq!(log.record_count(), 2);
}

// =============================================================================
// Erase semantics
// =============================================================================

/// Erasing resets the write offset and the sequence counter together.
#[test]
fn test_erase_all_resets_offset_and_counter() {
    let mut log = ExposureLog::new(MemoryStore::new());
    for i in 0..3u32 {
        log.append(i, &[i as u8; 16], &[i as u8; 4], -60, None).unwrap();
    }

    log.erase_all().unwrap();
    assert_eq!(log.record_count(), 0);
    assert_eq!(log.write_offset(), 0);
    assert_eq!(log.next_sequence(), 0);

    let offset = log.append(9, &[9; 16], &[9; 4], -60, None).unwrap();
    assert_eq!(offset, 0);
    assert_eq!(log.read_at(offset).unwrap().sequence, 0);
}

/// Reading an erased region fails rather than returning stale bytes.
#[test]
fn test_read_after_erase_fails() {
    let mut log = ExposureLog::new(MemoryStore::new());
    let offset = log.append(1, &[1; 16], &[1; 4], -60, None).unwrap();

    log.erase_all().unwrap();
    assert!(log.read_at(offset).is_err());
}

// =============================================================================
// Ingestion boundary
// =============================================================================

/// The scan collaborator's report lands as a well-formed record.
#[test]
fn test_report_observed_identifier_persists() {
    let mut log = ExposureLog::new(MemoryStore::new());

    let offset = log
        .report_observed_identifier([0xAB; 16], [1, 2, 3, 4], -80, 1_615_051_500)
        .expect("observation stored");

    let record = log.read_at(offset).unwrap();
    assert_eq!(record.rpi, [0xAB; 16]);
    assert_eq!(record.aem, [1, 2, 3, 4]);
    assert_eq!(record.rssi, -80);
    assert_eq!(record.timestamp, 1_615_051_500);
    assert_eq!(record.tx_power, None);
}

// =============================================================================
// File-backed store
// =============================================================================

/// The file store round-trips records and survives reopening.
#[test]
fn test_file_store_round_trip_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exposure.log");

    let mut log = ExposureLog::new(FileStore::open(&path).unwrap());
    let offset = log.append(77, &[7; 16], &[8; 4], -55, Some(4)).unwrap();
    let record = log.read_at(offset).unwrap();
    assert_eq!(record.timestamp, 77);
    drop(log);

    // Reopen as after a host restart, restoring counter and offset.
    let reopened = ExposureLog::resume(FileStore::open(&path).unwrap(), 1, RECORD_SIZE as u32);
    let back = reopened.read_at(offset).unwrap();
    assert_eq!(back, record);
    assert_eq!(reopened.next_sequence(), 1);
}

/// Erasing a file store truncates it.
#[test]
fn test_file_store_erase() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exposure.log");

    let mut log = ExposureLog::new(FileStore::open(&path).unwrap());
    let offset = log.append(77, &[7; 16], &[8; 4], -55, None).unwrap();
    log.erase_all().unwrap();

    assert!(log.read_at(offset).is_err());
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
}

// =============================================================================
// Record layout
// =============================================================================

/// Packed records are exactly the documented fixed size with big-endian
/// sequence and timestamp fields.
#[test]
fn test_record_wire_layout() {
    let record = EnsRecord {
        sequence: 0x010203,
        timestamp: 0xA1B2C3D4,
        rpi: [0x11; 16],
        aem: [0x22; 4],
        rssi: -61,
        tx_power: None,
    };

    let packed = record.pack();
    assert_eq!(packed.len(), RECORD_SIZE);
    assert_eq!(&packed[0..3], &[0x01, 0x02, 0x03]);
    assert_eq!(&packed[3..7], &[0xA1, 0xB2, 0xC3, 0xD4]);
    assert_eq!(&packed[11..27], &[0x11; 16]);
    assert_eq!(&packed[27..31], &[0x22; 4]);
    assert_eq!(EnsRecord::parse(&packed).unwrap(), record);
}
