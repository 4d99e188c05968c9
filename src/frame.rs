//! The sensor frame: one immutable snapshot per acquisition cycle.

use crate::ticks::Ticks;

/// Distance value reported when the ultrasonic channel returned no echo.
pub const DISTANCE_INVALID_CM: u32 = 999;

/// A point-in-time snapshot of every sensor on the node.
///
/// Invariant: when `is_valid` is false, `temperature_c` / `humidity_pct`
/// hold the last-known-good cache values, never a raw failed reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    /// Air temperature (Celsius).
    pub temperature_c: f32,
    /// Relative humidity (percent).
    pub humidity_pct: f32,
    /// PIR motion detected this cycle.
    pub motion: bool,
    /// Combustible gas detected.
    pub gas: bool,
    /// Sound detected (digital flag, possibly forced by the analog level).
    pub sound: bool,
    /// IR proximity object detected.
    pub ir_object: bool,
    /// Ranged distance in cm; [`DISTANCE_INVALID_CM`] when the ping failed.
    pub distance_cm: u32,
    /// Tick count at acquisition time.
    pub timestamp: Ticks,
    /// False when any retried channel exhausted its retries.
    pub is_valid: bool,
    /// Raw analog sound level (0–1023).
    pub sound_level: u16,
    /// Reserved analog gas level; always 0 on current hardware.
    pub gas_level: u16,
    /// DHT channel failed all retries this cycle.
    pub dht_error: bool,
    /// Ultrasonic channel returned no echo this cycle.
    pub ultrasonic_error: bool,
}

impl SensorFrame {
    /// A frame with every channel quiet and nominal ambient values.
    /// Used as the hub's pre-first-telemetry state and in tests.
    pub fn quiet(timestamp: Ticks) -> Self {
        Self {
            temperature_c: 25.0,
            humidity_pct: 50.0,
            motion: false,
            gas: false,
            sound: false,
            ir_object: false,
            distance_cm: 0,
            timestamp,
            is_valid: true,
            sound_level: 0,
            gas_level: 0,
            dht_error: false,
            ultrasonic_error: false,
        }
    }

    /// True when the frame is valid and no per-sensor error flag is set.
    /// Persistence only accepts frames that pass this check.
    pub fn is_clean(&self) -> bool {
        self.is_valid && !self.dht_error && !self.ultrasonic_error
    }
}
