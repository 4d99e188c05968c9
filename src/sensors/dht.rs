//! Temperature/humidity channel with retry and last-known-good fallback.
//!
//! The DHT family is the only sensor on the bus that fails routinely
//! (checksum errors under bus noise, NaN readings during self-heating).
//! The channel retries a fixed number of times with a fixed delay, then
//! falls back to the cached last valid pair and flags the cycle.

use log::warn;

use crate::app::ports::SensorBus;

/// Lowest plausible reading in Celsius; anything colder is a bus glitch.
pub const TEMP_MIN_C: f32 = -40.0;
/// Highest plausible reading in Celsius.
pub const TEMP_MAX_C: f32 = 80.0;

/// Cached last-known-good reading pair. Seeded with nominal indoor
/// ambient values so the very first failed cycle still reports something
/// the arbitration formulas can run on.
#[derive(Debug, Clone, Copy)]
pub struct LastValidCache {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl Default for LastValidCache {
    fn default() -> Self {
        Self {
            temperature_c: 25.0,
            humidity_pct: 50.0,
        }
    }
}

/// One DHT read cycle's outcome.
#[derive(Debug, Clone, Copy)]
pub struct DhtReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    /// All retries exhausted; the values above came from the cache.
    pub failed: bool,
}

pub struct DhtChannel {
    retry_count: u8,
    retry_delay_ms: u32,
    cache: LastValidCache,
}

impl DhtChannel {
    pub fn new(retry_count: u8, retry_delay_ms: u32) -> Self {
        Self {
            retry_count,
            retry_delay_ms,
            cache: LastValidCache::default(),
        }
    }

    /// Run one read cycle: up to `retry_count` attempts with
    /// `retry_delay_ms` between them, plausibility-checked, falling back
    /// to the cache when every attempt fails.
    pub fn read<B: SensorBus>(&mut self, bus: &mut B) -> DhtReading {
        for attempt in 0..self.retry_count {
            if attempt > 0 {
                bus.delay_ms(self.retry_delay_ms);
            }
            if let Some((t, h)) = bus.read_dht() {
                if plausible(t, h) {
                    self.cache = LastValidCache {
                        temperature_c: t,
                        humidity_pct: h,
                    };
                    return DhtReading {
                        temperature_c: t,
                        humidity_pct: h,
                        failed: false,
                    };
                }
                warn!("dht: implausible reading {:.1}C {:.1}% discarded", t, h);
            }
        }
        warn!(
            "dht: all {} attempts failed, using cached {:.1}C {:.1}%",
            self.retry_count, self.cache.temperature_c, self.cache.humidity_pct
        );
        DhtReading {
            temperature_c: self.cache.temperature_c,
            humidity_pct: self.cache.humidity_pct,
            failed: true,
        }
    }
}

/// Range plausibility gate: readings outside the sensor's physical
/// envelope count as failures even when the bus transfer succeeded.
fn plausible(temperature_c: f32, humidity_pct: f32) -> bool {
    (TEMP_MIN_C..=TEMP_MAX_C).contains(&temperature_c)
        && (0.0..=100.0).contains(&humidity_pct)
        && temperature_c.is_finite()
        && humidity_pct.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted bus: each element is one DHT attempt's result.
    struct ScriptedBus {
        script: Vec<Option<(f32, f32)>>,
        attempts: usize,
        delays: Vec<u32>,
    }

    impl ScriptedBus {
        fn new(script: Vec<Option<(f32, f32)>>) -> Self {
            Self {
                script,
                attempts: 0,
                delays: Vec::new(),
            }
        }
    }

    impl SensorBus for ScriptedBus {
        fn read_dht(&mut self) -> Option<(f32, f32)> {
            let r = self.script.get(self.attempts).copied().flatten();
            self.attempts += 1;
            r
        }
        fn read_motion(&mut self) -> bool {
            false
        }
        fn read_gas(&mut self) -> bool {
            false
        }
        fn read_sound(&mut self) -> bool {
            false
        }
        fn read_sound_level(&mut self) -> u16 {
            0
        }
        fn read_ir(&mut self) -> bool {
            false
        }
        fn ping_distance_cm(&mut self) -> u32 {
            0
        }
        fn delay_ms(&mut self, ms: u32) {
            self.delays.push(ms);
        }
    }

    #[test]
    fn first_attempt_success_needs_no_retry() {
        let mut bus = ScriptedBus::new(vec![Some((22.5, 48.0))]);
        let mut ch = DhtChannel::new(3, 1000);
        let r = ch.read(&mut bus);
        assert!(!r.failed);
        assert_eq!(r.temperature_c, 22.5);
        assert_eq!(bus.attempts, 1);
        assert!(bus.delays.is_empty());
    }

    #[test]
    fn recovers_on_second_attempt_after_one_delay() {
        let mut bus = ScriptedBus::new(vec![None, Some((23.0, 55.0))]);
        let mut ch = DhtChannel::new(3, 1000);
        let r = ch.read(&mut bus);
        assert!(!r.failed);
        assert_eq!(r.humidity_pct, 55.0);
        assert_eq!(bus.delays, vec![1000]);
    }

    #[test]
    fn exhausted_retries_fall_back_to_seed_cache() {
        let mut bus = ScriptedBus::new(vec![None, None, None]);
        let mut ch = DhtChannel::new(3, 1000);
        let r = ch.read(&mut bus);
        assert!(r.failed);
        assert_eq!(r.temperature_c, 25.0);
        assert_eq!(r.humidity_pct, 50.0);
        assert_eq!(bus.attempts, 3);
    }

    #[test]
    fn cache_holds_last_good_values_across_failures() {
        let mut ch = DhtChannel::new(3, 1000);
        let mut good = ScriptedBus::new(vec![Some((31.5, 62.0))]);
        assert!(!ch.read(&mut good).failed);

        let mut bad = ScriptedBus::new(vec![None, None, None]);
        let r = ch.read(&mut bad);
        assert!(r.failed);
        assert_eq!(r.temperature_c, 31.5);
        assert_eq!(r.humidity_pct, 62.0);
    }

    #[test]
    fn implausible_readings_count_as_failures() {
        // Transfer succeeds but values are outside the physical envelope.
        let mut bus = ScriptedBus::new(vec![
            Some((120.0, 50.0)),
            Some((25.0, 150.0)),
            Some((-60.0, 40.0)),
        ]);
        let mut ch = DhtChannel::new(3, 1000);
        let r = ch.read(&mut bus);
        assert!(r.failed);
        assert_eq!(r.temperature_c, 25.0, "cache untouched by bad values");
    }

    #[test]
    fn nan_is_rejected() {
        let mut bus = ScriptedBus::new(vec![Some((f32::NAN, 50.0)); 3]);
        let mut ch = DhtChannel::new(3, 1000);
        assert!(ch.read(&mut bus).failed);
    }

    #[test]
    fn boundary_values_are_plausible() {
        assert!(plausible(TEMP_MIN_C, 0.0));
        assert!(plausible(TEMP_MAX_C, 100.0));
        assert!(!plausible(TEMP_MAX_C + 0.1, 50.0));
    }
}
