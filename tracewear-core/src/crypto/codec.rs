// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Identifier/Metadata Codec
//!
//! Computes rolling proximity identifiers and encrypts the associated
//! broadcast metadata. The identifier is the AES-128-ECB encryption of a
//! padded interval block under the RPIK; the metadata ciphertext is
//! AES-128-CTR under the AEMK with the identifier itself as the initial
//! counter block, which cryptographically binds the pair: decrypting the
//! metadata requires the exact identifier that was current at encryption
//! time. Decrypting with any other identifier yields garbage, not an error.

use thiserror::Error;

use super::keys::{AemKey, RpiKey};
use super::primitives::{aes128_ctr_apply, aes128_ecb_decrypt, aes128_ecb_encrypt};

/// Length of a rolling proximity identifier in bytes.
pub const RPI_LENGTH: usize = 16;

/// Length of the associated encrypted metadata in bytes.
pub const AEM_LENGTH: usize = 4;

/// ASCII prefix of the padded identifier plaintext.
const RPI_PAD_PREFIX: &[u8; 6] = b"EN-RPI";

/// Byte offset of the interval number inside the padded plaintext.
const RPI_INTERVAL_OFFSET: usize = 12;

/// Metadata encryption error types.
#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("Metadata must be exactly {AEM_LENGTH} bytes, got {0}")]
    InvalidLength(usize),
}

/// Metadata decryption error types.
#[derive(Error, Debug)]
pub enum DecryptionError {
    #[error("Ciphertext must be exactly {AEM_LENGTH} bytes, got {0}")]
    InvalidLength(usize),
}

/// A rolling proximity identifier: the broadcast pseudonym.
///
/// Not secret once broadcast; Debug renders it as hex.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Rpi([u8; RPI_LENGTH]);

impl std::fmt::Debug for Rpi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rpi({})", hex::encode(self.0))
    }
}

impl Rpi {
    /// Creates an identifier from raw bytes (e.g. an observed broadcast).
    pub fn from_bytes(bytes: [u8; RPI_LENGTH]) -> Self {
        Rpi(bytes)
    }

    /// Returns a reference to the identifier bytes.
    pub fn as_bytes(&self) -> &[u8; RPI_LENGTH] {
        &self.0
    }
}

/// Associated encrypted metadata: the 4-byte ciphertext broadcast next to
/// the identifier.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Aem([u8; AEM_LENGTH]);

impl std::fmt::Debug for Aem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Aem({})", hex::encode(self.0))
    }
}

impl Aem {
    /// Creates metadata ciphertext from raw bytes.
    pub fn from_bytes(bytes: [u8; AEM_LENGTH]) -> Self {
        Aem(bytes)
    }

    /// Returns a reference to the ciphertext bytes.
    pub fn as_bytes(&self) -> &[u8; AEM_LENGTH] {
        &self.0
    }
}

/// An identifier/metadata pair from a single rotation tick.
///
/// `Copy` on purpose: the advertising collaborator always receives a
/// snapshot by value, never a live reference into the scheduler's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastPayload {
    /// The rolling proximity identifier.
    pub rpi: Rpi,
    /// Metadata encrypted under this exact identifier.
    pub aem: Aem,
}

/// Builds the padded plaintext block for an interval number:
/// `"EN-RPI"` ‖ six zero bytes ‖ the interval, little-endian.
pub fn rpi_plaintext(interval: u32) -> [u8; RPI_LENGTH] {
    let mut padded = [0u8; RPI_LENGTH];
    padded[..RPI_PAD_PREFIX.len()].copy_from_slice(RPI_PAD_PREFIX);
    padded[RPI_INTERVAL_OFFSET..].copy_from_slice(&interval.to_le_bytes());
    padded
}

/// Reads the interval number back out of a decrypted identifier block.
pub fn interval_from_plaintext(plaintext: &[u8; RPI_LENGTH]) -> u32 {
    let mut le = [0u8; 4];
    le.copy_from_slice(&plaintext[RPI_INTERVAL_OFFSET..]);
    u32::from_le_bytes(le)
}

/// Computes the rolling proximity identifier for an interval.
///
/// Pure, deterministic function of `(rpik, interval)`.
pub fn compute_rpi(rpik: &RpiKey, interval: u32) -> Rpi {
    Rpi(aes128_ecb_encrypt(rpik.as_bytes(), &rpi_plaintext(interval)))
}

/// Decrypts an identifier back to its padded plaintext.
///
/// Diagnostic inverse of [`compute_rpi`]; use
/// [`interval_from_plaintext`] to recover the embedded interval number.
pub fn decrypt_rpi(rpik: &RpiKey, rpi: &Rpi) -> [u8; RPI_LENGTH] {
    aes128_ecb_decrypt(rpik.as_bytes(), rpi.as_bytes())
}

/// Encrypts the 4-byte broadcast metadata, bound to the given identifier.
///
/// The identifier is borrowed immutably and copied internally before it is
/// used as the CTR counter block, so the caller's identifier is never
/// mutated regardless of how the underlying primitive treats its counter.
pub fn encrypt_metadata(
    aemk: &AemKey,
    rpi: &Rpi,
    metadata: &[u8],
) -> Result<Aem, EncryptionError> {
    if metadata.len() != AEM_LENGTH {
        return Err(EncryptionError::InvalidLength(metadata.len()));
    }

    let mut out = [0u8; AEM_LENGTH];
    out.copy_from_slice(metadata);
    aes128_ctr_apply(aemk.as_bytes(), *rpi.as_bytes(), &mut out);
    Ok(Aem(out))
}

/// Decrypts associated metadata.
///
/// CTR is self-inverse given the identical key and counter block; the
/// identifier must be the one current when the metadata was encrypted.
pub fn decrypt_metadata(
    aemk: &AemKey,
    rpi: &Rpi,
    aem: &Aem,
) -> Result<[u8; AEM_LENGTH], DecryptionError> {
    let mut out = *aem.as_bytes();
    aes128_ctr_apply(aemk.as_bytes(), *rpi.as_bytes(), &mut out);
    Ok(out)
}

/// Slice-based decryption for observed broadcasts of unverified length.
pub fn decrypt_metadata_slice(
    aemk: &AemKey,
    rpi: &Rpi,
    aem: &[u8],
) -> Result<[u8; AEM_LENGTH], DecryptionError> {
    let bytes: [u8; AEM_LENGTH] = aem
        .try_into()
        .map_err(|_| DecryptionError::InvalidLength(aem.len()))?;
    decrypt_metadata(aemk, rpi, &Aem(bytes))
}
