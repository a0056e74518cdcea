//! Rotation Scheduler
//!
//! Drives the periodic identifier refresh as a single, strictly serialized
//! task. The host's cooperative runner arms a one-shot deadline and calls
//! [`RotationScheduler::poll`]; when the deadline has passed, one full tick
//! runs to completion: pause broadcast, rotate expired keys, compute the
//! new identifier, bind fresh metadata to it, publish, re-arm, resume.
//!
//! The rotation period is re-drawn uniformly from [601, 1199] seconds on
//! every firing. A fixed period would let an observer link consecutive
//! identifiers by their rotation cadence.

use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AdvMetadata;
use crate::crypto::codec::{compute_rpi, encrypt_metadata, BroadcastPayload, EncryptionError};
use crate::crypto::keys::{KeyHierarchy, KeyHierarchyError};
use crate::time::Clock;

/// Shortest rotation period, exclusive of the 10-minute interval boundary.
pub const ROTATION_INTERVAL_MIN_SECS: u32 = 601;

/// Longest rotation period, exclusive of the 20-minute mark.
pub const ROTATION_INTERVAL_MAX_SECS: u32 = 1199;

/// Re-arm period after a failed tick: the midpoint of the jitter range.
pub const ROTATION_FALLBACK_SECS: u32 = 900;

/// Advertiser boundary failure.
#[derive(Error, Debug)]
pub enum AdvertiseError {
    #[error("Advertiser device error: {0}")]
    Device(String),
}

/// Outward-broadcast collaborator consumed by the scheduler.
///
/// Receives the identifier/metadata pair by value: always a snapshot of a
/// completed tick, never a reference into scheduler state.
pub trait Advertiser {
    /// Pauses outward broadcast while the payload is being replaced.
    fn pause(&mut self) -> Result<(), AdvertiseError>;

    /// Resumes outward broadcast.
    fn resume(&mut self) -> Result<(), AdvertiseError>;

    /// Installs a new broadcast payload.
    fn publish(&mut self, payload: BroadcastPayload) -> Result<(), AdvertiseError>;
}

/// Mock advertiser for tests.
#[derive(Debug, Default)]
pub struct MockAdvertiser {
    /// Every payload published, in order.
    pub published: Vec<BroadcastPayload>,
    /// Whether broadcast is currently running.
    pub broadcasting: bool,
    /// Number of pause calls.
    pub pause_count: u32,
    /// Number of resume calls.
    pub resume_count: u32,
    /// Simulate publish failures.
    pub fail_publish: bool,
    /// Simulate pause failures.
    pub fail_pause: bool,
}

impl MockAdvertiser {
    /// Creates a mock that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently published payload.
    pub fn last_published(&self) -> Option<&BroadcastPayload> {
        self.published.last()
    }
}

impl Advertiser for MockAdvertiser {
    fn pause(&mut self) -> Result<(), AdvertiseError> {
        if self.fail_pause {
            return Err(AdvertiseError::Device("simulated pause failure".into()));
        }
        self.broadcasting = false;
        self.pause_count += 1;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AdvertiseError> {
        self.broadcasting = true;
        self.resume_count += 1;
        Ok(())
    }

    fn publish(&mut self, payload: BroadcastPayload) -> Result<(), AdvertiseError> {
        if self.fail_publish {
            return Err(AdvertiseError::Device("simulated publish failure".into()));
        }
        self.published.push(payload);
        Ok(())
    }
}

/// Scheduler error types.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Rotation already started")]
    AlreadyStarted,

    #[error("Exposure service is paused")]
    ServicePaused,

    #[error("Key hierarchy error: {0}")]
    Keys(#[from] KeyHierarchyError),

    #[error("Metadata encryption error: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("Advertiser error: {0}")]
    Advertise(#[from] AdvertiseError),
}

/// Result of one poll of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The armed deadline has not passed (or the timer is not armed).
    NotDue,
    /// A full tick ran and a fresh payload was published.
    Rotated,
    /// A firing arrived while a tick was in progress and was suppressed.
    Suppressed,
}

/// Draws one rotation period, uniform over the closed jitter range.
pub fn draw_rotation_interval<R: Rng>(rng: &mut R) -> u32 {
    rng.gen_range(ROTATION_INTERVAL_MIN_SECS..=ROTATION_INTERVAL_MAX_SECS)
}

/// The rotation task and its one-shot timer state.
///
/// Owns the key hierarchy: the tick is the only writer of the active
/// key/identifier tuple. Readers take snapshot copies via
/// [`current_payload`](Self::current_payload).
pub struct RotationScheduler<A: Advertiser, C: Clock> {
    keys: KeyHierarchy,
    advertiser: A,
    clock: C,
    metadata: AdvMetadata,
    payload: Option<BroadcastPayload>,
    payload_interval: Option<u32>,
    next_fire_at: Option<u32>,
    service_paused: bool,
    in_tick: bool,
}

impl<A: Advertiser, C: Clock> RotationScheduler<A, C> {
    /// Creates a scheduler around an existing key hierarchy.
    pub fn new(keys: KeyHierarchy, advertiser: A, clock: C, metadata: AdvMetadata) -> Self {
        RotationScheduler {
            keys,
            advertiser,
            clock,
            metadata,
            payload: None,
            payload_interval: None,
            next_fire_at: None,
            service_paused: false,
            in_tick: false,
        }
    }

    /// Runs the first tick and arms the timer.
    ///
    /// Starting twice is an error: reconfiguration is explicit
    /// stop-then-start, never an implicit overwrite.
    pub fn start(&mut self) -> Result<(), ScheduleError> {
        if self.next_fire_at.is_some() {
            return Err(ScheduleError::AlreadyStarted);
        }
        if self.service_paused {
            return Err(ScheduleError::ServicePaused);
        }
        self.tick()
    }

    /// Disarms the timer. The last published payload stays live.
    pub fn stop(&mut self) {
        self.next_fire_at = None;
    }

    /// Whether the rotation timer is armed.
    pub fn is_started(&self) -> bool {
        self.next_fire_at.is_some()
    }

    /// Runs a tick if the armed deadline has passed.
    ///
    /// A failed tick returns the error but leaves the scheduler armed (with
    /// the fallback period) and the previous payload broadcasting; rotation
    /// never stalls permanently on a transient failure.
    pub fn poll(&mut self) -> Result<TickOutcome, ScheduleError> {
        if self.service_paused {
            return Ok(TickOutcome::NotDue);
        }
        let Some(deadline) = self.next_fire_at else {
            return Ok(TickOutcome::NotDue);
        };
        if self.clock.now_unix() < deadline {
            return Ok(TickOutcome::NotDue);
        }
        if self.in_tick {
            warn!("Timer fired during an in-progress tick, suppressing");
            return Ok(TickOutcome::Suppressed);
        }

        self.tick()?;
        Ok(TickOutcome::Rotated)
    }

    /// Forces a rotation outside the timer, e.g. when the host notices the
    /// EN interval rolled over before the jittered deadline.
    pub fn rotate_now(&mut self) -> Result<(), ScheduleError> {
        if self.service_paused {
            return Err(ScheduleError::ServicePaused);
        }
        self.tick()
    }

    /// Pauses the whole service: broadcast off, rotation disarmed, state
    /// kept.
    pub fn pause_service(&mut self) -> Result<(), ScheduleError> {
        if self.service_paused {
            return Ok(());
        }
        self.advertiser.pause()?;
        self.service_paused = true;
        self.stop();
        info!("Exposure service paused");
        Ok(())
    }

    /// Resumes the service with a fresh identifier.
    ///
    /// Broadcasting the pre-pause identifier again would let an observer
    /// bridge the gap, so resuming always rotates.
    pub fn resume_service(&mut self) -> Result<(), ScheduleError> {
        if !self.service_paused {
            return Ok(());
        }
        self.service_paused = false;
        self.tick()?;
        info!("Exposure service resumed");
        Ok(())
    }

    /// Whether the service is paused.
    pub fn is_service_paused(&self) -> bool {
        self.service_paused
    }

    /// Snapshot copy of the currently published identifier/metadata pair.
    pub fn current_payload(&self) -> Option<BroadcastPayload> {
        self.payload
    }

    /// Whether the published identifier no longer matches the current EN
    /// interval (or none has been published yet).
    pub fn identifier_expired(&self) -> bool {
        self.payload_interval != Some(self.clock.now_interval())
    }

    /// Unix time the armed timer fires, if armed.
    pub fn next_deadline(&self) -> Option<u32> {
        self.next_fire_at
    }

    /// The key hierarchy (e.g. for the temporary-key-list upload path).
    pub fn keys(&self) -> &KeyHierarchy {
        &self.keys
    }

    /// The advertising collaborator.
    pub fn advertiser(&self) -> &A {
        &self.advertiser
    }

    /// Mutable access to the advertising collaborator (host configuration).
    pub fn advertiser_mut(&mut self) -> &mut A {
        &mut self.advertiser
    }

    /// One serialized tick with the failure policy applied.
    fn tick(&mut self) -> Result<(), ScheduleError> {
        self.in_tick = true;
        let result = self.run_tick();
        if let Err(ref err) = result {
            warn!(%err, "Rotation tick aborted, keeping previous identifier");
            // The timer must re-arm even on failure or rotation stalls.
            self.arm(ROTATION_FALLBACK_SECS);
            if let Err(resume_err) = self.advertiser.resume() {
                warn!(%resume_err, "Failed to resume broadcast after aborted tick");
            }
        }
        self.in_tick = false;
        result
    }

    /// The tick procedure. Any step failure aborts the remainder; the
    /// wrapper in [`tick`](Self::tick) restores broadcast and the timer.
    fn run_tick(&mut self) -> Result<(), ScheduleError> {
        self.advertiser.pause()?;

        let interval = self.clock.now_interval();
        if self.keys.rotate_if_expired(interval)? {
            info!(
                valid_from = self.keys.tek().valid_from(),
                "Key hierarchy rotated"
            );
        }

        let rpi = compute_rpi(self.keys.rpik(), interval);
        let aem = encrypt_metadata(self.keys.aemk(), &rpi, &self.metadata.to_bytes())?;
        let payload = BroadcastPayload { rpi, aem };

        self.advertiser.publish(payload)?;
        // Publish succeeded; the snapshot and its interval change together.
        self.payload = Some(payload);
        self.payload_interval = Some(interval);

        let period = draw_rotation_interval(&mut rand::thread_rng());
        self.arm(period);
        self.advertiser.resume()?;

        info!(
            rpi = %hex::encode(&payload.rpi.as_bytes()[..4]),
            next_rotation_in = period,
            "Published rotated identifier"
        );
        Ok(())
    }

    fn arm(&mut self, period_secs: u32) {
        self.next_fire_at = Some(self.clock.now_unix() + period_secs);
    }
}
