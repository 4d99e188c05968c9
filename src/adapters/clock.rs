//! Tick sources.

use std::time::Instant;

use crate::app::ports::Clock;
use crate::ticks::Ticks;

/// Wall-process monotonic clock. Milliseconds since construction,
/// truncated to the tick width; wraparound after ~49.7 days is handled
/// by every consumer comparing differences, never absolutes.
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Ticks {
        self.epoch.elapsed().as_millis() as Ticks
    }
}

/// Manually advanced clock for tests and the simulator.
pub struct ManualClock {
    now: std::cell::Cell<Ticks>,
}

impl ManualClock {
    pub fn at(start: Ticks) -> Self {
        Self {
            now: std::cell::Cell::new(start),
        }
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Ticks {
        self.now.get()
    }
}
