// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tracewear Core Library
//!
//! Privacy-preserving proximity-identifier engine for a contact-tracing
//! wearable: derives the rotating key hierarchy and broadcast identifiers,
//! schedules their jittered refresh, and logs identifiers observed from
//! nearby devices for later exposure-risk evaluation.
//! HKDF and secure randomness use the audited `ring` crate; the
//! protocol-mandated AES-128-ECB/CTR modes use the RustCrypto ciphers.
//!
//! The radio itself (advertising, scanning, GATT) and the raw storage
//! medium are external collaborators behind the [`scheduler::Advertiser`]
//! and [`records::RecordStore`] traits.

pub mod config;
pub mod crypto;
pub mod records;
pub mod scheduler;
pub mod time;

pub use config::{AdvMetadata, ServiceSettings, METADATA_VERSION};
pub use crypto::{
    compute_rpi, decrypt_metadata, decrypt_rpi, encrypt_metadata, Aem, AemKey, BroadcastPayload,
    DecryptionError, EncryptionError, KeyDerivationError, KeyHierarchy, KeyHierarchyError,
    RandomSourceError, Rpi, RpiKey, TemporaryExposureKey, AEM_LENGTH, KEY_LENGTH, RPI_LENGTH,
    TEK_ROLLING_PERIOD,
};
pub use records::{
    EnsRecord, ExposureLog, FileStore, MemoryStore, RecordStore, StorageError, RECORD_SIZE,
    SEQUENCE_MAX,
};
pub use scheduler::{
    draw_rotation_interval, AdvertiseError, Advertiser, MockAdvertiser, RotationScheduler,
    ScheduleError, TickOutcome, ROTATION_FALLBACK_SECS, ROTATION_INTERVAL_MAX_SECS,
    ROTATION_INTERVAL_MIN_SECS,
};
pub use time::{en_interval_number, Clock, ManualClock, SystemClock, EN_INTERVAL_SECONDS};
