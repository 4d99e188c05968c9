//! Ultrasonic ranging channel.
//!
//! The transducer reports 0 when no echo returns within the timing
//! window. That raw 0 is ambiguous (contact distance vs. open room), so
//! it is mapped to a large sentinel that downstream consumers and the
//! wire format treat as "nothing in range".

use crate::app::ports::SensorBus;
use crate::frame::DISTANCE_INVALID_CM;

/// One ranging cycle's outcome.
#[derive(Debug, Clone, Copy)]
pub struct RangeReading {
    /// Distance in cm, or [`DISTANCE_INVALID_CM`] on a missed echo.
    pub distance_cm: u32,
    /// The ping returned no echo.
    pub failed: bool,
}

/// Take one ranging sample and normalize the no-echo case.
pub fn range<B: SensorBus>(bus: &mut B) -> RangeReading {
    let raw = bus.ping_distance_cm();
    if raw == 0 {
        RangeReading {
            distance_cm: DISTANCE_INVALID_CM,
            failed: true,
        }
    } else {
        RangeReading {
            distance_cm: raw,
            failed: false,
        }
    }
}
