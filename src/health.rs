//! Periodic liveness snapshots.
//!
//! Once per interval the control loop emits a health snapshot: uptime,
//! radio signal, free heap, and the current sensor error flags. The
//! snapshot is logged and offered to the telemetry path as a keepalive;
//! it never gates the control loop.

use log::info;

use crate::app::ports::PlatformInfoPort;
use crate::frame::SensorFrame;
use crate::ticks::{ticks_since, Ticks};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthReport {
    pub uptime_secs: u32,
    pub signal_dbm: Option<i8>,
    pub free_heap_bytes: u32,
    pub dht_error: bool,
    pub ultrasonic_error: bool,
}

impl HealthReport {
    pub fn has_errors(&self) -> bool {
        self.dht_error || self.ultrasonic_error
    }
}

pub struct HealthMonitor {
    interval_ticks: u32,
    last_emit: Option<Ticks>,
}

impl HealthMonitor {
    pub fn new(interval_secs: u32) -> Self {
        Self {
            interval_ticks: interval_secs.saturating_mul(1000),
            last_emit: None,
        }
    }

    /// True when a snapshot is due. The first call is always due so a
    /// fresh boot reports immediately.
    pub fn due(&self, now: Ticks) -> bool {
        match self.last_emit {
            None => true,
            Some(prev) => ticks_since(now, prev) >= self.interval_ticks,
        }
    }

    /// Build, log, and timestamp one snapshot.
    pub fn emit<P: PlatformInfoPort>(
        &mut self,
        platform: &P,
        frame: &SensorFrame,
        now: Ticks,
    ) -> HealthReport {
        self.last_emit = Some(now);
        let report = HealthReport {
            uptime_secs: now / 1000,
            signal_dbm: platform.signal_dbm(),
            free_heap_bytes: platform.free_heap_bytes(),
            dht_error: frame.dht_error,
            ultrasonic_error: frame.ultrasonic_error,
        };
        info!(
            "health: up {}s signal {:?}dBm heap {}B errors={}",
            report.uptime_secs,
            report.signal_dbm,
            report.free_heap_bytes,
            report.has_errors()
        );
        report
    }
}
