//! Monotonic tick arithmetic.
//!
//! All timers in the system are expressed as `u32` millisecond tick
//! counts that wrap after ~49.7 days of uptime. Elapsed time is always
//! computed via wrapping subtraction and compared as a difference, never
//! by absolute magnitude, so counter wraparound cannot fire or suppress
//! a timeout spuriously.

/// Millisecond tick count. Wraps at `u32::MAX`.
pub type Ticks = u32;

/// Ticks elapsed between `then` and `now`, wraparound-safe.
#[inline]
pub fn ticks_since(now: Ticks, then: Ticks) -> u32 {
    now.wrapping_sub(then)
}

/// Periodic cadence gate for the cooperative loops.
///
/// The loops spin fast (tens of ms per pass) so every timer advances
/// each iteration; slow work like a sensor cycle arms one of these and
/// runs only when [`ready`](Interval::ready) fires. First call always
/// fires.
pub struct Interval {
    period: u32,
    last: Option<Ticks>,
}

impl Interval {
    pub fn new(period: u32) -> Self {
        Self { period, last: None }
    }

    /// True when a full period has elapsed since the last firing;
    /// rearms itself on firing.
    pub fn ready(&mut self, now: Ticks) -> bool {
        let due = match self.last {
            None => true,
            Some(prev) => ticks_since(now, prev) >= self.period,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}
