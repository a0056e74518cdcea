// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Key Hierarchy Manager
//!
//! Owns the active (TEK, RPIK, AEMK) triple. The Temporary Exposure Key is
//! the 24-hour root secret; the identifier and metadata keys are pure HKDF
//! derivations from it and are always replaced together with the TEK, never
//! independently.

use thiserror::Error;
use zeroize::Zeroize;

use super::primitives::{
    fill_random, hkdf_sha256_16, KeyDerivationError, RandomSourceError, KEY_LENGTH,
};

/// Number of EN intervals a Temporary Exposure Key stays valid (24 hours).
pub const TEK_ROLLING_PERIOD: u32 = 144;

/// HKDF info string for the Rolling Proximity Identifier Key.
const RPIK_INFO: &[u8] = b"EN-RPIK";

/// HKDF info string for the Associated Encrypted Metadata Key.
const AEMK_INFO: &[u8] = b"EN-AEMK";

/// Key hierarchy error types.
#[derive(Error, Debug)]
pub enum KeyHierarchyError {
    #[error(transparent)]
    RandomSource(#[from] RandomSourceError),

    #[error(transparent)]
    Derivation(#[from] KeyDerivationError),
}

/// The 24-hour root secret of the key hierarchy.
#[derive(Clone)]
pub struct TemporaryExposureKey {
    bytes: [u8; KEY_LENGTH],
    valid_from: u32,
}

impl std::fmt::Debug for TemporaryExposureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose key bytes in debug output
        f.debug_struct("TemporaryExposureKey")
            .field("bytes", &"[REDACTED]")
            .field("valid_from", &self.valid_from)
            .finish()
    }
}

impl Drop for TemporaryExposureKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl TemporaryExposureKey {
    /// Draws a fresh TEK from the secure random source.
    ///
    /// `valid_from` is aligned down to the start of the current rolling
    /// period, so a key generated mid-day still expires at the day boundary.
    pub fn generate(current_interval: u32) -> Result<Self, RandomSourceError> {
        let mut bytes = [0u8; KEY_LENGTH];
        fill_random(&mut bytes)?;

        Ok(TemporaryExposureKey {
            bytes,
            valid_from: (current_interval / TEK_ROLLING_PERIOD) * TEK_ROLLING_PERIOD,
        })
    }

    /// Creates a TEK from raw bytes with an explicit validity start.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH], valid_from: u32) -> Self {
        TemporaryExposureKey { bytes, valid_from }
    }

    /// Returns a reference to the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.bytes
    }

    /// First EN interval at which this key is valid.
    pub fn valid_from(&self) -> u32 {
        self.valid_from
    }

    /// Whether the key's 144-interval validity window has passed.
    pub fn is_expired(&self, current_interval: u32) -> bool {
        current_interval >= self.valid_from + TEK_ROLLING_PERIOD
    }

    /// Derives the Rolling Proximity Identifier Key from this TEK.
    pub fn derive_rpik(&self) -> Result<RpiKey, KeyDerivationError> {
        Ok(RpiKey(hkdf_sha256_16(&self.bytes, RPIK_INFO)?))
    }

    /// Derives the Associated Encrypted Metadata Key from this TEK.
    pub fn derive_aemk(&self) -> Result<AemKey, KeyDerivationError> {
        Ok(AemKey(hkdf_sha256_16(&self.bytes, AEMK_INFO)?))
    }
}

/// Key for computing rolling proximity identifiers.
#[derive(Clone)]
pub struct RpiKey([u8; KEY_LENGTH]);

impl std::fmt::Debug for RpiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpiKey").field("bytes", &"[REDACTED]").finish()
    }
}

impl Drop for RpiKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl RpiKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        RpiKey(bytes)
    }

    /// Returns a reference to the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

/// Key for encrypting associated broadcast metadata.
#[derive(Clone)]
pub struct AemKey([u8; KEY_LENGTH]);

impl std::fmt::Debug for AemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AemKey").field("bytes", &"[REDACTED]").finish()
    }
}

impl Drop for AemKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl AemKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        AemKey(bytes)
    }

    /// Returns a reference to the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

/// The active key triple.
///
/// A hierarchy only exists in a fully-derived state: construction derives
/// RPIK and AEMK from the freshly drawn TEK before the value is handed out,
/// and [`rotate`](Self::rotate) builds the complete replacement triple before
/// swapping it in. A partially-updated triple is never observable.
pub struct KeyHierarchy {
    tek: TemporaryExposureKey,
    rpik: RpiKey,
    aemk: AemKey,
}

impl std::fmt::Debug for KeyHierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyHierarchy")
            .field("valid_from", &self.tek.valid_from())
            .finish()
    }
}

impl KeyHierarchy {
    /// Generates a fresh hierarchy for the given EN interval.
    pub fn generate(current_interval: u32) -> Result<Self, KeyHierarchyError> {
        let tek = TemporaryExposureKey::generate(current_interval)?;
        let rpik = tek.derive_rpik()?;
        let aemk = tek.derive_aemk()?;
        Ok(KeyHierarchy { tek, rpik, aemk })
    }

    /// Builds a hierarchy from an existing TEK (tests, key restore).
    pub fn from_tek(tek: TemporaryExposureKey) -> Result<Self, KeyHierarchyError> {
        let rpik = tek.derive_rpik()?;
        let aemk = tek.derive_aemk()?;
        Ok(KeyHierarchy { tek, rpik, aemk })
    }

    /// Whether the TEK's validity window has passed.
    pub fn is_expired(&self, current_interval: u32) -> bool {
        self.tek.is_expired(current_interval)
    }

    /// Replaces the triple with a freshly derived one.
    ///
    /// The new TEK, RPIK and AEMK are all derived before any field is
    /// touched; on error the existing triple is left intact.
    pub fn rotate(&mut self, current_interval: u32) -> Result<(), KeyHierarchyError> {
        let tek = TemporaryExposureKey::generate(current_interval)?;
        let rpik = tek.derive_rpik()?;
        let aemk = tek.derive_aemk()?;

        self.tek = tek;
        self.rpik = rpik;
        self.aemk = aemk;
        Ok(())
    }

    /// Rotates only if expired. Returns whether a rotation happened.
    pub fn rotate_if_expired(&mut self, current_interval: u32) -> Result<bool, KeyHierarchyError> {
        if self.is_expired(current_interval) {
            self.rotate(current_interval)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// The current TEK.
    ///
    /// Exposed for the temporary-key-list upload path; the derived RPIK and
    /// AEMK never leave the hierarchy except by reference to the codec.
    pub fn tek(&self) -> &TemporaryExposureKey {
        &self.tek
    }

    /// The current identifier key.
    pub fn rpik(&self) -> &RpiKey {
        &self.rpik
    }

    /// The current metadata key.
    pub fn aemk(&self) -> &AemKey {
        &self.aemk
    }
}
