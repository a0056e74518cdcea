// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Crypto Primitives Adapter
//!
//! Thin boundary over the primitive crates: HKDF-SHA256 and the system
//! CSPRNG come from the audited `ring` crate; AES-128-ECB and AES-128-CTR
//! are protocol-mandated cipher modes that ring deliberately does not
//! expose, so they use the RustCrypto `aes`/`ctr` crates (documented
//! exception to the ring-only rule).
//!
//! No other module touches `ring`, `aes`, or `ctr` directly.

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit, KeyIvInit, StreamCipher};
use aes::Aes128;
use ring::hkdf;
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

/// AES-128-CTR with the full 16-byte counter block interpreted big-endian,
/// matching the reference protocol's CTR construction.
type Aes128Ctr = ctr::Ctr128BE<Aes128>;

/// Length of every key and identifier in the protocol (128-bit AES).
pub const KEY_LENGTH: usize = 16;

/// The secure random source was unavailable.
///
/// Fatal to the operation that needed it; there is no weak fallback.
#[derive(Error, Debug)]
#[error("Secure random source unavailable")]
pub struct RandomSourceError;

/// Key derivation error types.
#[derive(Error, Debug)]
pub enum KeyDerivationError {
    #[error("Input key length and output key length must match")]
    LengthMismatch,
    #[error("HKDF primitive failure")]
    Primitive,
}

/// Fills `buf` from the system's cryptographically secure random source.
pub fn fill_random(buf: &mut [u8]) -> Result<(), RandomSourceError> {
    let rng = SystemRandom::new();
    rng.fill(buf).map_err(|_| RandomSourceError)
}

/// ring's HKDF output length is expressed through a `KeyType`; this one
/// carries an arbitrary byte length.
struct OkmLength(usize);

impl hkdf::KeyType for OkmLength {
    fn len(&self) -> usize {
        self.0
    }
}

/// HKDF-SHA256 with an empty salt and a 16-byte output.
///
/// The protocol derives every sub-key with output length equal to the input
/// key length; both are fixed at [`KEY_LENGTH`].
pub fn hkdf_sha256_16(
    ikm: &[u8; KEY_LENGTH],
    info: &[u8],
) -> Result<[u8; KEY_LENGTH], KeyDerivationError> {
    let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, &[]);
    let prk = salt.extract(ikm);
    let info_components = [info];
    let okm = prk
        .expand(&info_components, OkmLength(KEY_LENGTH))
        .map_err(|_| KeyDerivationError::Primitive)?;

    let mut out = [0u8; KEY_LENGTH];
    okm.fill(&mut out).map_err(|_| KeyDerivationError::Primitive)?;
    Ok(out)
}

/// Encrypts a single 16-byte block with AES-128-ECB.
pub fn aes128_ecb_encrypt(key: &[u8; KEY_LENGTH], block: &[u8; 16]) -> [u8; 16] {
    let cipher = Aes128::new(key.into());
    let mut out = *block;
    cipher.encrypt_block((&mut out).into());
    out
}

/// Decrypts a single 16-byte block with AES-128-ECB.
pub fn aes128_ecb_decrypt(key: &[u8; KEY_LENGTH], block: &[u8; 16]) -> [u8; 16] {
    let cipher = Aes128::new(key.into());
    let mut out = *block;
    cipher.decrypt_block((&mut out).into());
    out
}

/// Applies the AES-128-CTR keystream to `data` in place.
///
/// Takes the counter block by value: the stream cipher advances its counter
/// internally, so the caller's identifier bytes are never mutated.
pub fn aes128_ctr_apply(key: &[u8; KEY_LENGTH], counter_block: [u8; 16], data: &mut [u8]) {
    let mut cipher = Aes128Ctr::new(key.into(), &counter_block.into());
    cipher.apply_keystream(data);
}
