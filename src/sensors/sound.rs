//! Sound channel: digital flag with an analog override.
//!
//! The detector exposes both a digital comparator output and the raw
//! analog level. The comparator's onboard trim pot drifts, so a level
//! above the configured threshold forces the flag on even when the
//! digital line stayed low. The digital line is never forced off.

use crate::app::ports::SensorBus;

#[derive(Debug, Clone, Copy)]
pub struct SoundReading {
    /// Effective sound flag after the analog override.
    pub detected: bool,
    /// Raw analog level (0–1023).
    pub level: u16,
}

pub fn sample<B: SensorBus>(bus: &mut B, analog_threshold: u16) -> SoundReading {
    let digital = bus.read_sound();
    let level = bus.read_sound_level();
    SoundReading {
        detected: digital || level > analog_threshold,
        level,
    }
}
