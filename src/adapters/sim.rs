//! Simulated hardware backends.
//!
//! Stand-ins for the sensor bus, relay board, platform metrics, and
//! network link. They let the full node loop run on a development host
//! and give integration tests something deterministic to drive.

use log::info;

use crate::app::ports::{ConnectivityPort, PlatformInfoPort, RelayPort, SensorBus};
use crate::arbiter::IndicatorColor;

/// Scriptable sensor bus: tests and the demo loop poke the public
/// fields between cycles.
pub struct SimSensorBus {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub dht_healthy: bool,
    pub motion: bool,
    pub gas: bool,
    pub sound: bool,
    pub sound_level: u16,
    pub ir: bool,
    pub distance_cm: u32,
}

impl Default for SimSensorBus {
    fn default() -> Self {
        Self {
            temperature_c: 24.0,
            humidity_pct: 45.0,
            dht_healthy: true,
            motion: false,
            gas: false,
            sound: false,
            sound_level: 60,
            ir: false,
            distance_cm: 150,
        }
    }
}

impl SensorBus for SimSensorBus {
    fn read_dht(&mut self) -> Option<(f32, f32)> {
        self.dht_healthy
            .then_some((self.temperature_c, self.humidity_pct))
    }

    fn read_motion(&mut self) -> bool {
        self.motion
    }

    fn read_gas(&mut self) -> bool {
        self.gas
    }

    fn read_sound(&mut self) -> bool {
        self.sound
    }

    fn read_sound_level(&mut self) -> u16 {
        self.sound_level
    }

    fn read_ir(&mut self) -> bool {
        self.ir
    }

    fn ping_distance_cm(&mut self) -> u32 {
        self.distance_cm
    }

    fn delay_ms(&mut self, _ms: u32) {
        // Simulated time: retries are instantaneous.
    }
}

/// Relay board that records the last commanded outputs.
#[derive(Default)]
pub struct SimRelayBoard {
    pub fan: bool,
    pub exhaust: bool,
    pub room_light: bool,
    pub main_light: bool,
    pub buzzer: bool,
    pub indicator: IndicatorColor,
}

impl RelayPort for SimRelayBoard {
    fn set_fan(&mut self, on: bool) {
        if self.fan != on {
            info!("relay: fan -> {}", on);
        }
        self.fan = on;
    }

    fn set_exhaust(&mut self, on: bool) {
        if self.exhaust != on {
            info!("relay: exhaust -> {}", on);
        }
        self.exhaust = on;
    }

    fn set_room_light(&mut self, on: bool) {
        if self.room_light != on {
            info!("relay: room light -> {}", on);
        }
        self.room_light = on;
    }

    fn set_main_light(&mut self, on: bool) {
        if self.main_light != on {
            info!("relay: main light -> {}", on);
        }
        self.main_light = on;
    }

    fn set_buzzer(&mut self, on: bool) {
        if self.buzzer != on {
            info!("relay: buzzer -> {}", on);
        }
        self.buzzer = on;
    }

    fn set_indicator(&mut self, colour: IndicatorColor) {
        if self.indicator != colour {
            info!("relay: indicator -> {:?}", colour);
        }
        self.indicator = colour;
    }
}

/// Fixed platform metrics for the host build.
pub struct SimPlatformInfo;

impl PlatformInfoPort for SimPlatformInfo {
    fn signal_dbm(&self) -> Option<i8> {
        Some(-55)
    }

    fn free_heap_bytes(&self) -> u32 {
        256 * 1024
    }
}

/// Network link that can be scripted down and recovers after a set
/// number of reconnect kicks.
pub struct SimLink {
    pub up: bool,
    pub kicks_until_recovery: u32,
}

impl Default for SimLink {
    fn default() -> Self {
        Self {
            up: true,
            kicks_until_recovery: 0,
        }
    }
}

impl ConnectivityPort for SimLink {
    fn is_connected(&mut self) -> bool {
        self.up
    }

    fn reconnect(&mut self) {
        if self.kicks_until_recovery > 0 {
            self.kicks_until_recovery -= 1;
            if self.kicks_until_recovery == 0 {
                self.up = true;
            }
        }
    }
}

/// Apply one arbitration result to a relay port. Shared by the node
/// loop and the hub loop; the write order is fixed so log traces stay
/// comparable across runs.
pub fn apply_state<R: RelayPort>(relays: &mut R, state: &crate::arbiter::ActuatorState) {
    relays.set_fan(state.fan);
    relays.set_exhaust(state.exhaust);
    relays.set_room_light(state.room_light);
    relays.set_main_light(state.main_light);
    relays.set_buzzer(state.buzzer_pulse_active);
    relays.set_indicator(state.indicator);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::ActuatorState;

    #[test]
    fn sim_bus_reports_scripted_values() {
        let mut bus = SimSensorBus {
            motion: true,
            distance_cm: 42,
            ..SimSensorBus::default()
        };
        assert!(bus.read_motion());
        assert_eq!(bus.ping_distance_cm(), 42);
        assert!(bus.read_dht().is_some());
        bus.dht_healthy = false;
        assert!(bus.read_dht().is_none());
    }

    #[test]
    fn apply_state_mirrors_every_output() {
        let mut relays = SimRelayBoard::default();
        let state = ActuatorState {
            fan: true,
            main_light: true,
            buzzer_pulse_active: true,
            indicator: IndicatorColor::Motion,
            ..ActuatorState::default()
        };
        apply_state(&mut relays, &state);
        assert!(relays.fan && relays.main_light && relays.buzzer);
        assert!(!relays.exhaust && !relays.room_light);
        assert_eq!(relays.indicator, IndicatorColor::Motion);
    }

    #[test]
    fn sim_link_recovers_after_scripted_kicks() {
        let mut link = SimLink {
            up: false,
            kicks_until_recovery: 2,
        };
        assert!(!link.is_connected());
        link.reconnect();
        assert!(!link.is_connected());
        link.reconnect();
        assert!(link.is_connected());
    }
}
