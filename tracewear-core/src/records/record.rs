// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fixed-layout exposure record
//!
//! Packs one observed advertisement into the wearable exposure notification
//! record format: a 3-byte sequence number and 4-byte timestamp (both MSB
//! first) followed by an LTV envelope holding the observed identifier and
//! metadata payload, the received signal strength, and the transmit power.
//! Records are fixed-size so the store offset arithmetic stays trivial.

use super::store::StorageError;
use crate::crypto::codec::{AEM_LENGTH, RPI_LENGTH};

/// Total size of one packed record in bytes.
pub const RECORD_SIZE: usize = 37;

/// Highest value of the 24-bit sequence counter before it wraps to zero.
pub const SEQUENCE_MAX: u32 = 0xFF_FFFF;

/// TX power sentinel meaning "not available".
pub const TX_POWER_UNKNOWN: u8 = 0x7F;

/// Combined identifier + metadata payload length.
const ENS_PAYLOAD_LENGTH: usize = RPI_LENGTH + AEM_LENGTH;

/// LTV envelope length: every byte after the remaining-length field.
const REMAINING_LENGTH: u16 = 28;

/// LTV type tag for the exposure payload.
const TAG_ENS_DATA: u8 = 0x00;

/// LTV type tag for the RSSI value.
const TAG_RSSI: u8 = 0x02;

/// LTV type tag for the TX power value.
const TAG_TX_POWER: u8 = 0x03;

/// One observed-advertisement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsRecord {
    /// 24-bit sequence number assigned at append time.
    pub sequence: u32,
    /// Unix timestamp of the observation.
    pub timestamp: u32,
    /// Observed rolling proximity identifier.
    pub rpi: [u8; RPI_LENGTH],
    /// Observed associated encrypted metadata.
    pub aem: [u8; AEM_LENGTH],
    /// Received signal strength in dBm.
    pub rssi: i8,
    /// Advertised transmit power in dBm, if the advertisement carried one.
    pub tx_power: Option<i8>,
}

impl EnsRecord {
    /// Packs the record into its fixed wire layout.
    ///
    /// Only the three least significant bytes of the sequence number are
    /// used; multi-byte integers are MSB first.
    pub fn pack(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];

        buf[0] = (self.sequence >> 16) as u8;
        buf[1] = (self.sequence >> 8) as u8;
        buf[2] = self.sequence as u8;

        buf[3..7].copy_from_slice(&self.timestamp.to_be_bytes());

        buf[7..9].copy_from_slice(&REMAINING_LENGTH.to_be_bytes());

        buf[9] = ENS_PAYLOAD_LENGTH as u8;
        buf[10] = TAG_ENS_DATA;
        buf[11..11 + RPI_LENGTH].copy_from_slice(&self.rpi);
        buf[27..27 + AEM_LENGTH].copy_from_slice(&self.aem);

        buf[31] = 0x01;
        buf[32] = TAG_RSSI;
        buf[33] = self.rssi as u8;

        buf[34] = 0x01;
        buf[35] = TAG_TX_POWER;
        buf[36] = self.tx_power.map(|p| p as u8).unwrap_or(TX_POWER_UNKNOWN);

        buf
    }

    /// Parses a record from its wire layout.
    pub fn parse(buf: &[u8]) -> Result<Self, StorageError> {
        if buf.len() < RECORD_SIZE {
            return Err(StorageError::TruncatedRecord(buf.len()));
        }

        let remaining = u16::from_be_bytes([buf[7], buf[8]]);
        if remaining != REMAINING_LENGTH {
            return Err(StorageError::MalformedRecord(format!(
                "unexpected envelope length {remaining}"
            )));
        }
        if buf[9] != ENS_PAYLOAD_LENGTH as u8 || buf[10] != TAG_ENS_DATA {
            return Err(StorageError::MalformedRecord(
                "bad exposure payload LTV header".to_string(),
            ));
        }
        if buf[31] != 0x01 || buf[32] != TAG_RSSI {
            return Err(StorageError::MalformedRecord(
                "bad RSSI LTV header".to_string(),
            ));
        }
        if buf[34] != 0x01 || buf[35] != TAG_TX_POWER {
            return Err(StorageError::MalformedRecord(
                "bad TX power LTV header".to_string(),
            ));
        }

        let mut rpi = [0u8; RPI_LENGTH];
        rpi.copy_from_slice(&buf[11..11 + RPI_LENGTH]);
        let mut aem = [0u8; AEM_LENGTH];
        aem.copy_from_slice(&buf[27..27 + AEM_LENGTH]);

        let tx_power = match buf[36] {
            TX_POWER_UNKNOWN => None,
            value => Some(value as i8),
        };

        Ok(EnsRecord {
            sequence: u32::from_be_bytes([0, buf[0], buf[1], buf[2]]),
            timestamp: u32::from_be_bytes([buf[3], buf[4], buf[5], buf[6]]),
            rpi,
            aem,
            rssi: buf[33] as i8,
            tx_power,
        })
    }
}
