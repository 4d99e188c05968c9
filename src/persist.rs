//! Durable actuator snapshot.
//!
//! The hub persists the four manual overrides and the four relay
//! outputs so a power cycle brings the room back where it was. The
//! record is a fixed 12-byte layout guarded by a 2-byte marker:
//!
//! ```text
//! offset  0..4   override booleans (fan, exhaust, room, main), one byte each
//! offset  4..8   actuator booleans, same order
//! offset  8..10  reserved, written as zero
//! offset 10..12  marker 0xAA55, little-endian
//! ```
//!
//! Any byte outside {0,1} in the boolean region, or a wrong marker,
//! invalidates the whole record. Writes are rate-limited to protect
//! flash endurance and are skipped entirely while the current frame
//! carries error flags, so a sensor fault can never be snapshotted.

use log::{info, warn};

use crate::app::ports::StoragePort;
use crate::arbiter::{ActuatorState, IndicatorColor, ManualOverrideSet};
use crate::error::PersistError;
use crate::ticks::{ticks_since, Ticks};

const MARKER: u16 = 0xAA55;
const RECORD_LEN: usize = 12;
const NAMESPACE: &str = "hearth";
const KEY: &str = "actuators";

/// What survives a reboot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistedRecord {
    pub overrides: ManualOverrideSet,
    pub fan: bool,
    pub exhaust: bool,
    pub room_light: bool,
    pub main_light: bool,
}

impl PersistedRecord {
    pub fn capture(overrides: &ManualOverrideSet, state: &ActuatorState) -> Self {
        Self {
            overrides: *overrides,
            fan: state.fan,
            exhaust: state.exhaust,
            room_light: state.room_light,
            main_light: state.main_light,
        }
    }

    /// Rehydrate an [`ActuatorState`] for the arbiter's restore path.
    /// Pulse and indicator are transient and come back at defaults.
    pub fn to_state(&self) -> ActuatorState {
        ActuatorState {
            fan: self.fan,
            exhaust: self.exhaust,
            room_light: self.room_light,
            main_light: self.main_light,
            buzzer_pulse_active: false,
            indicator: IndicatorColor::Idle,
        }
    }

    fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0] = self.overrides.fan as u8;
        buf[1] = self.overrides.exhaust as u8;
        buf[2] = self.overrides.room_light as u8;
        buf[3] = self.overrides.main_light as u8;
        buf[4] = self.fan as u8;
        buf[5] = self.exhaust as u8;
        buf[6] = self.room_light as u8;
        buf[7] = self.main_light as u8;
        buf[10..12].copy_from_slice(&MARKER.to_le_bytes());
        buf
    }

    fn decode(buf: &[u8]) -> Result<Self, PersistError> {
        if buf.len() != RECORD_LEN {
            return Err(PersistError::Corrupted);
        }
        let marker = u16::from_le_bytes([buf[10], buf[11]]);
        if marker != MARKER {
            return Err(PersistError::Corrupted);
        }
        // Erased flash reads as 0xFF; anything outside 0/1 means the
        // record was never fully committed.
        if buf[..8].iter().any(|&b| b > 1) {
            return Err(PersistError::Corrupted);
        }
        Ok(Self {
            overrides: ManualOverrideSet {
                fan: buf[0] == 1,
                exhaust: buf[1] == 1,
                room_light: buf[2] == 1,
                main_light: buf[3] == 1,
            },
            fan: buf[4] == 1,
            exhaust: buf[5] == 1,
            room_light: buf[6] == 1,
            main_light: buf[7] == 1,
        })
    }
}

/// Rate-limited writer over any [`StoragePort`].
pub struct PersistenceStore<S: StoragePort> {
    storage: S,
    min_interval_ticks: u32,
    last_write: Option<Ticks>,
    last_written: Option<PersistedRecord>,
}

impl<S: StoragePort> PersistenceStore<S> {
    pub fn new(storage: S, min_interval_ticks: u32) -> Self {
        Self {
            storage,
            min_interval_ticks,
            last_write: None,
            last_written: None,
        }
    }

    /// Load the persisted record, if a valid one exists.
    ///
    /// A missing record (first boot) is `Ok(None)`. A present but
    /// invalid record is an error so the caller can log the corruption
    /// before falling back to defaults.
    pub fn load(&self) -> Result<Option<PersistedRecord>, PersistError> {
        if !self.storage.exists(NAMESPACE, KEY) {
            return Ok(None);
        }
        let mut buf = [0u8; RECORD_LEN];
        let n = self
            .storage
            .read(NAMESPACE, KEY, &mut buf)
            .map_err(|_| PersistError::Corrupted)?;
        let record = PersistedRecord::decode(&buf[..n])?;
        info!("persist: restored record {:?}", record);
        Ok(Some(record))
    }

    /// Commit the record if the rate limit allows and the frame backing
    /// it is clean. Returns true when a write actually happened.
    pub fn maybe_save(
        &mut self,
        record: &PersistedRecord,
        now: Ticks,
        frame_clean: bool,
    ) -> Result<bool, PersistError> {
        if !frame_clean {
            return Ok(false);
        }
        if let Some(prev) = self.last_write {
            if ticks_since(now, prev) < self.min_interval_ticks {
                return Ok(false);
            }
        }
        // Unchanged since the last commit: refresh nothing.
        if self.last_written.as_ref() == Some(record) {
            return Ok(false);
        }

        self.commit(record, now)?;
        Ok(true)
    }

    /// Commit the record unconditionally, bypassing the rate limit and
    /// the unchanged check. Shutdown path only: the process is about to
    /// restart and whatever was toggled recently must not be lost.
    pub fn force_save(&mut self, record: &PersistedRecord, now: Ticks) -> Result<(), PersistError> {
        self.commit(record, now)
    }

    fn commit(&mut self, record: &PersistedRecord, now: Ticks) -> Result<(), PersistError> {
        self.storage
            .write(NAMESPACE, KEY, &record.encode())
            .map_err(|e| {
                warn!("persist: commit failed: {}", e);
                PersistError::CommitFailed
            })?;
        self.last_write = Some(now);
        self.last_written = Some(*record);
        info!("persist: committed record at tick {}", now);
        Ok(())
    }
}
