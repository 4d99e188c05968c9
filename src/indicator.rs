//! Error LED blink patterns.
//!
//! The node carries a single diagnostic LED whose blink cadence encodes
//! which sensor channel is failing, readable without a serial console:
//!
//! - DHT failing: slow single blink (400 ms period, on for 200 ms)
//! - Ultrasonic failing: double blink (400 ms period, two 100 ms flashes)
//! - Both failing: rapid triple flash (600 ms period, three 100 ms flashes)
//! - Neither: LED off, phase reset
//!
//! The engine is time-driven and stateless apart from the phase
//! accumulator, so the control loop can tick it at any cadence.

/// Which failure pattern is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Off,
    Dht,
    Ultrasonic,
    Both,
}

pub struct ErrorLed {
    phase_ms: u32,
    pattern: Pattern,
}

impl Default for ErrorLed {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorLed {
    pub fn new() -> Self {
        Self {
            phase_ms: 0,
            pattern: Pattern::Off,
        }
    }

    /// Advance the pattern clock by `delta_ms` and return the LED level.
    /// A pattern change resets the phase so each cadence starts at the
    /// beginning of its cycle.
    pub fn tick(&mut self, delta_ms: u32, dht_error: bool, ultrasonic_error: bool) -> bool {
        let next = match (dht_error, ultrasonic_error) {
            (false, false) => Pattern::Off,
            (true, false) => Pattern::Dht,
            (false, true) => Pattern::Ultrasonic,
            (true, true) => Pattern::Both,
        };
        if next != self.pattern {
            self.pattern = next;
            self.phase_ms = 0;
        } else {
            self.phase_ms = self.phase_ms.wrapping_add(delta_ms);
        }

        match self.pattern {
            Pattern::Off => false,
            Pattern::Dht => self.phase_ms % 400 < 200,
            Pattern::Ultrasonic => {
                let p = self.phase_ms % 400;
                p < 100 || (200..300).contains(&p)
            }
            Pattern::Both => {
                let p = self.phase_ms % 600;
                p < 100 || (200..300).contains(&p) || (400..500).contains(&p)
            }
        }
    }
}
