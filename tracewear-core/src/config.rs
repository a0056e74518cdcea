//! Configuration for the exposure notification service
//!
//! Mirrors the settings block a wearable exposes over its exposure
//! notification service: retention, key lifetimes, and the advertising and
//! scanning cadence the radio collaborator applies. The core only consumes
//! a few of these directly; the rest are carried so a host can persist and
//! round-trip the whole settings block.

use serde::{Deserialize, Serialize};

use crate::crypto::codec::AEM_LENGTH;

/// Metadata version byte advertised in the clear part of the metadata
/// record (major 1, minor 0).
pub const METADATA_VERSION: u8 = 0x40;

/// Settings block for the exposure notification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// How long observed records are retained, in days.
    pub data_retention_days: u8,

    /// Length of a temporary key in bytes.
    pub temp_key_length: u8,

    /// Maximum key lifetime in minutes.
    pub max_key_duration_minutes: u16,

    /// Length of one exposure advertisement in bytes.
    pub adv_length: u8,

    /// Maximum advertising burst duration, in seconds.
    pub max_adv_duration: u8,

    /// Scanner on-time per duty cycle, in seconds.
    pub scan_on_time: u8,

    /// Scanner off-time per duty cycle, in seconds.
    pub scan_off_time: u16,

    /// Minimum advertising interval, in 0.625 ms units.
    pub min_adv_interval: u16,

    /// Maximum advertising interval, in 0.625 ms units.
    pub max_adv_interval: u16,

    /// Whether the wearable may pause/resume the service on its own.
    pub self_pause_resume: bool,

    /// Transmit power the radio reports in broadcast metadata, in dBm.
    pub tx_power: i8,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            data_retention_days: 14,
            temp_key_length: 16,
            max_key_duration_minutes: 1440, // 24 hours
            adv_length: 29,
            max_adv_duration: 10,
            scan_on_time: 4,
            scan_off_time: 60,
            min_adv_interval: 0x0140,
            max_adv_interval: 0x01B0,
            self_pause_resume: false,
            tx_power: 0,
        }
    }
}

impl ServiceSettings {
    /// Sets the reported transmit power.
    pub fn with_tx_power(mut self, tx_power: i8) -> Self {
        self.tx_power = tx_power;
        self
    }

    /// Allows the wearable to pause/resume the service itself.
    pub fn with_self_pause_resume(mut self) -> Self {
        self.self_pause_resume = true;
        self
    }

    /// The plaintext metadata record derived from these settings.
    pub fn metadata(&self) -> AdvMetadata {
        AdvMetadata {
            tx_power: self.tx_power,
            version_flags: METADATA_VERSION,
        }
    }
}

/// The fixed 4-byte plaintext metadata record carried (encrypted) next to
/// each rolling identifier.
///
/// Wire layout, fixed by the broadcast collaborator:
/// `[reserved, reserved, tx_power, version_flags]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvMetadata {
    /// Transmit power in dBm, for received-signal distance estimation.
    pub tx_power: i8,
    /// Protocol version flags.
    pub version_flags: u8,
}

impl Default for AdvMetadata {
    fn default() -> Self {
        Self {
            tx_power: 0,
            version_flags: METADATA_VERSION,
        }
    }
}

impl AdvMetadata {
    /// Serializes to the fixed wire layout.
    pub fn to_bytes(self) -> [u8; AEM_LENGTH] {
        [0, 0, self.tx_power as u8, self.version_flags]
    }

    /// Parses from the fixed wire layout.
    pub fn from_bytes(bytes: [u8; AEM_LENGTH]) -> Self {
        Self {
            tx_power: bytes[2] as i8,
            version_flags: bytes[3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_wire_round_trip() {
        let metadata = AdvMetadata {
            tx_power: -8,
            version_flags: METADATA_VERSION,
        };
        let bytes = metadata.to_bytes();
        assert_eq!(bytes, [0, 0, 0xF8, 0x40]);
        assert_eq!(AdvMetadata::from_bytes(bytes), metadata);
    }

    #[test]
    fn test_settings_serde_round_trip() {
        let settings = ServiceSettings::default()
            .with_tx_power(-4)
            .with_self_pause_resume();
        let json = serde_json::to_string(&settings).unwrap();
        let back: ServiceSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_default_settings_match_firmware_values() {
        let settings = ServiceSettings::default();
        assert_eq!(settings.data_retention_days, 14);
        assert_eq!(settings.max_key_duration_minutes, 1440);
        assert_eq!(settings.temp_key_length, 16);
    }
}
