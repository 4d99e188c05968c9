//! Sensor acquisition: turns raw bus reads into [`SensorFrame`]s.
//!
//! Per-channel policy lives in the submodules:
//! - [`dht`]: retry, plausibility gate, last-known-good fallback
//! - [`ultrasonic`]: no-echo sentinel mapping
//! - [`sound`]: analog override of the digital flag
//!
//! [`SensorHub::acquire`] composes them into one frame per cycle. A
//! cycle never aborts: each failing channel reports its fallback value
//! and error flag, and the frame ships regardless.

pub mod dht;
pub mod sound;
pub mod ultrasonic;

use log::debug;

use crate::app::ports::SensorBus;
use crate::config::SystemConfig;
use crate::frame::SensorFrame;
use crate::ticks::Ticks;

pub use dht::DhtChannel;

/// Acquisition front-end for the node's full sensor suite.
pub struct SensorHub {
    dht: DhtChannel,
    sound_analog_threshold: u16,
}

impl SensorHub {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            dht: DhtChannel::new(config.dht_retry_count, config.dht_retry_delay_ms),
            sound_analog_threshold: config.sound_analog_threshold,
        }
    }

    /// Run one full acquisition cycle and assemble the frame.
    pub fn acquire<B: SensorBus>(&mut self, bus: &mut B, now: Ticks) -> SensorFrame {
        let dht = self.dht.read(bus);
        let motion = bus.read_motion();
        let gas = bus.read_gas();
        let sound = sound::sample(bus, self.sound_analog_threshold);
        let ir_object = bus.read_ir();
        let range = ultrasonic::range(bus);

        let frame = SensorFrame {
            temperature_c: dht.temperature_c,
            humidity_pct: dht.humidity_pct,
            motion,
            gas,
            sound: sound.detected,
            ir_object,
            distance_cm: range.distance_cm,
            timestamp: now,
            is_valid: !dht.failed,
            sound_level: sound.level,
            gas_level: 0,
            dht_error: dht.failed,
            ultrasonic_error: range.failed,
        };
        debug!(
            "acquired frame t={:.1}C h={:.1}% motion={} gas={} sound={} dist={}cm valid={}",
            frame.temperature_c,
            frame.humidity_pct,
            frame.motion,
            frame.gas,
            frame.sound,
            frame.distance_cm,
            frame.is_valid
        );
        frame
    }
}
