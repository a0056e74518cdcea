// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod codec;
pub mod keys;
pub mod primitives;

pub use codec::{
    compute_rpi, decrypt_metadata, decrypt_rpi, encrypt_metadata, Aem, BroadcastPayload,
    DecryptionError, EncryptionError, Rpi, AEM_LENGTH, RPI_LENGTH,
};
pub use keys::{
    AemKey, KeyHierarchy, KeyHierarchyError, RpiKey, TemporaryExposureKey, TEK_ROLLING_PERIOD,
};
pub use primitives::{KeyDerivationError, RandomSourceError, KEY_LENGTH};
