//! Time Source Seam
//!
//! The wearable's real-time clock is an external collaborator; this module
//! only adapts it. All rotating identifiers are windowed on the
//! Exposure Notification interval number, a counter of 10-minute epochs
//! since the Unix epoch.

use std::cell::Cell;

/// Seconds per Exposure Notification interval.
pub const EN_INTERVAL_SECONDS: u32 = 600;

/// Returns the EN interval number for a Unix timestamp.
pub fn en_interval_number(unix_seconds: u32) -> u32 {
    unix_seconds / EN_INTERVAL_SECONDS
}

/// Returns the Unix timestamp at which the given interval begins.
pub fn interval_start_unix(interval: u32) -> u32 {
    interval * EN_INTERVAL_SECONDS
}

/// Source of the current Unix time.
pub trait Clock {
    /// Current Unix time in seconds.
    fn now_unix(&self) -> u32;

    /// Current EN interval number.
    fn now_interval(&self) -> u32 {
        en_interval_number(self.now_unix())
    }
}

/// Wall-clock time from the operating system.
///
/// Falls back to 0 if the system clock is before UNIX_EPOCH (should never
/// happen).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u32 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0)
    }
}

/// Settable clock for tests and simulation.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    /// Creates a manual clock starting at the given Unix time.
    pub fn new(unix_seconds: u32) -> Self {
        ManualClock {
            now: Cell::new(unix_seconds),
        }
    }

    /// Sets the current time.
    pub fn set(&self, unix_seconds: u32) {
        self.now.set(unix_seconds);
    }

    /// Advances the current time by `seconds`.
    pub fn advance(&self, seconds: u32) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> u32 {
        self.now.get()
    }
}

impl Clock for &ManualClock {
    fn now_unix(&self) -> u32 {
        self.now.get()
    }
}
