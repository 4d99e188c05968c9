//! Actuator arbitration: the hub's central decision engine.
//!
//! Reconciles sensor-driven behaviour with sticky manual overrides and
//! produces one atomically-committed [`ActuatorState`] per cycle:
//!
//! | Output      | Rule                                              |
//! |-------------|---------------------------------------------------|
//! | fan         | temperature above threshold OR override          |
//! | exhaust     | gas detected OR override                         |
//! | room light  | override only; never sensor-driven              |
//! | main light  | motion/IR OR override; auto-off on motion timeout |
//! | buzzer      | edge-triggered fixed-length pulse on sound       |
//! | indicator   | Motion > Hazard > Idle precedence                |
//!
//! [`arbitrate`](ActuatorArbiter::arbitrate) is gated by a debounce
//! window: a cycle arriving before the window has elapsed is a no-op
//! that returns the previous state unchanged.
//! [`poll`](ActuatorArbiter::poll) runs every loop iteration, bypassing
//! the debounce: it owns the main-light motion timeout and the buzzer
//! pulse auto-clear, both of which must fire between sensor cycles.
//!
//! A sound event arriving while a pulse is already active does not
//! extend the pulse. The timeout/debounce asymmetry and the
//! non-extending pulse are part of the product contract; do not "fix"
//! them here.

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::frame::SensorFrame;
use crate::ticks::{ticks_since, Ticks};

// ---------------------------------------------------------------------------
// Override set
// ---------------------------------------------------------------------------

/// Sticky manual overrides, one per controllable actuator.
///
/// Mutated only by the toggle interface; the arbiter never writes these.
/// No inherent expiry; an override stays set until toggled off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverrideSet {
    pub fan: bool,
    pub exhaust: bool,
    pub room_light: bool,
    pub main_light: bool,
}

/// The actuator an inbound toggle request names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleTarget {
    Fan,
    Exhaust,
    RoomLight,
    MainLight,
}

impl ManualOverrideSet {
    /// Flip one override flag. Returns the new value.
    pub fn toggle(&mut self, target: ToggleTarget) -> bool {
        let slot = match target {
            ToggleTarget::Fan => &mut self.fan,
            ToggleTarget::Exhaust => &mut self.exhaust,
            ToggleTarget::RoomLight => &mut self.room_light,
            ToggleTarget::MainLight => &mut self.main_light,
        };
        *slot = !*slot;
        *slot
    }
}

// ---------------------------------------------------------------------------
// Actuator state
// ---------------------------------------------------------------------------

/// Status indicator colour, by precedence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorColor {
    /// Nothing notable; ambient blue.
    #[default]
    Idle,
    /// Motion or IR proximity active; green.
    Motion,
    /// Gas detected; red.
    Hazard,
}

/// Derived actuator outputs. Recomputed whole every arbitration cycle;
/// partial updates are never observable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorState {
    pub fan: bool,
    pub exhaust: bool,
    pub room_light: bool,
    pub main_light: bool,
    pub buzzer_pulse_active: bool,
    pub indicator: IndicatorColor,
}

// ---------------------------------------------------------------------------
// Arbiter
// ---------------------------------------------------------------------------

/// The arbitration state machine.
///
/// Pure given `(frame, overrides, now)` apart from three hidden timers:
/// the debounce anchor, the last-motion timestamp, and the buzzer pulse
/// start. It never fails; a stale frame runs through the same formulas.
pub struct ActuatorArbiter {
    temp_threshold_c: f32,
    debounce_ticks: u32,
    light_timeout_ticks: u32,
    buzzer_pulse_ticks: u32,

    /// Tick of the last committed arbitration; `None` before the first.
    last_update: Option<Ticks>,
    /// Tick of the last observed motion/IR edge.
    last_motion: Option<Ticks>,
    /// Tick the current buzzer pulse started; `None` when no pulse runs.
    buzzer_since: Option<Ticks>,

    state: ActuatorState,
}

impl ActuatorArbiter {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            temp_threshold_c: config.temp_threshold_c,
            debounce_ticks: config.debounce_ticks,
            light_timeout_ticks: config.main_light_timeout_ticks,
            buzzer_pulse_ticks: config.buzzer_pulse_ticks,
            last_update: None,
            last_motion: None,
            buzzer_since: None,
            state: ActuatorState::default(),
        }
    }

    /// Seed the output state from a persisted record at startup, so the
    /// relays come back where a crash left them.
    ///
    /// A restored main light counts as motion seen at `now`: without a
    /// fresh motion edge it still times out one window after boot
    /// instead of staying on forever.
    pub fn restore(&mut self, state: ActuatorState, now: Ticks) {
        self.state = state;
        if state.main_light {
            self.last_motion = Some(now);
        }
    }

    /// Run one arbitration cycle.
    ///
    /// Returns the previous state unchanged when called again before the
    /// debounce window has elapsed. Otherwise computes and commits all
    /// six outputs from the frame and overrides.
    pub fn arbitrate(
        &mut self,
        frame: &SensorFrame,
        overrides: &ManualOverrideSet,
        now: Ticks,
    ) -> ActuatorState {
        if let Some(prev) = self.last_update {
            if ticks_since(now, prev) < self.debounce_ticks {
                return self.state;
            }
        }
        self.last_update = Some(now);

        let motion_now = frame.motion || frame.ir_object;
        if motion_now {
            self.last_motion = Some(now);
        }

        // Edge-triggered pulse: a sound event starts a pulse only when
        // none is running; retriggering does not extend it.
        if frame.sound && self.buzzer_since.is_none() {
            self.buzzer_since = Some(now);
        }

        self.state = ActuatorState {
            fan: frame.temperature_c > self.temp_threshold_c || overrides.fan,
            exhaust: frame.gas || overrides.exhaust,
            room_light: overrides.room_light,
            main_light: motion_now || overrides.main_light,
            buzzer_pulse_active: self.buzzer_since.is_some(),
            indicator: if motion_now {
                IndicatorColor::Motion
            } else if frame.gas {
                IndicatorColor::Hazard
            } else {
                IndicatorColor::Idle
            },
        };
        self.state
    }

    /// Continuous timer pass; call every loop iteration.
    ///
    /// Bypasses the debounce window deliberately: the motion timeout and
    /// the buzzer auto-clear must fire even when no sensor cycle runs.
    pub fn poll(&mut self, overrides: &ManualOverrideSet, now: Ticks) -> ActuatorState {
        if self.state.main_light && !overrides.main_light {
            if let Some(t) = self.last_motion {
                if ticks_since(now, t) > self.light_timeout_ticks {
                    self.state.main_light = false;
                }
            }
        }

        if let Some(t) = self.buzzer_since {
            if ticks_since(now, t) > self.buzzer_pulse_ticks {
                self.state.buzzer_pulse_active = false;
                self.buzzer_since = None;
            }
        }

        self.state
    }

    /// The most recently committed state.
    pub fn state(&self) -> ActuatorState {
        self.state
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn arbiter() -> ActuatorArbiter {
        ActuatorArbiter::new(&SystemConfig::default())
    }

    fn quiet(ts: Ticks) -> SensorFrame {
        SensorFrame::quiet(ts)
    }

    const NO_OVR: ManualOverrideSet = ManualOverrideSet {
        fan: false,
        exhaust: false,
        room_light: false,
        main_light: false,
    };

    #[test]
    fn hot_room_turns_fan_on_and_nothing_else() {
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.temperature_c = 32.0; // threshold 30.0
        let s = arb.arbitrate(&frame, &NO_OVR, 0);
        assert!(s.fan);
        assert!(!s.exhaust);
        assert!(!s.room_light);
        assert!(!s.main_light);
        assert!(!s.buzzer_pulse_active);
        assert_eq!(s.indicator, IndicatorColor::Idle);
    }

    #[test]
    fn temperature_at_threshold_is_not_hot() {
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.temperature_c = 30.0;
        assert!(!arb.arbitrate(&frame, &NO_OVR, 0).fan);
    }

    #[test]
    fn gas_drives_exhaust_and_hazard_indicator() {
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.gas = true;
        let s = arb.arbitrate(&frame, &NO_OVR, 0);
        assert!(s.exhaust);
        assert_eq!(s.indicator, IndicatorColor::Hazard);
    }

    #[test]
    fn motion_beats_hazard_in_indicator_precedence() {
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.gas = true;
        frame.motion = true;
        let s = arb.arbitrate(&frame, &NO_OVR, 0);
        assert_eq!(s.indicator, IndicatorColor::Motion);
        assert!(s.exhaust, "gas still drives exhaust under motion");
    }

    #[test]
    fn room_light_is_override_only() {
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.motion = true;
        frame.temperature_c = 45.0;
        assert!(!arb.arbitrate(&frame, &NO_OVR, 0).room_light);

        let ovr = ManualOverrideSet {
            room_light: true,
            ..NO_OVR
        };
        assert!(arb.arbitrate(&quiet(2000), &ovr, 2000).room_light);
    }

    #[test]
    fn overrides_force_actuators_regardless_of_sensors() {
        let mut arb = arbiter();
        let ovr = ManualOverrideSet {
            fan: true,
            exhaust: true,
            room_light: true,
            main_light: true,
        };
        let s = arb.arbitrate(&quiet(0), &ovr, 0);
        assert!(s.fan && s.exhaust && s.room_light && s.main_light);
    }

    #[test]
    fn debounced_cycle_returns_previous_state_unchanged() {
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.temperature_c = 32.0;
        let first = arb.arbitrate(&frame, &NO_OVR, 1000);

        // 500 ticks later with very different inputs; inside the window.
        let mut frame2 = quiet(1500);
        frame2.gas = true;
        frame2.temperature_c = 10.0;
        let second = arb.arbitrate(&frame2, &NO_OVR, 1500);
        assert_eq!(first, second);

        // Once the window elapses the new inputs take effect.
        let third = arb.arbitrate(&frame2, &NO_OVR, 2000);
        assert!(!third.fan);
        assert!(third.exhaust);
    }

    #[test]
    fn arbitrate_is_pure_given_identical_inputs() {
        let mut a = arbiter();
        let mut b = arbiter();
        let mut frame = quiet(0);
        frame.motion = true;
        frame.temperature_c = 31.0;
        assert_eq!(
            a.arbitrate(&frame, &NO_OVR, 0),
            b.arbitrate(&frame, &NO_OVR, 0)
        );
    }

    #[test]
    fn motion_turns_main_light_on_with_motion_indicator() {
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.motion = true;
        let s = arb.arbitrate(&frame, &NO_OVR, 0);
        assert!(s.main_light);
        assert_eq!(s.indicator, IndicatorColor::Motion);
    }

    #[test]
    fn ir_object_counts_as_motion() {
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.ir_object = true;
        let s = arb.arbitrate(&frame, &NO_OVR, 0);
        assert!(s.main_light);
        assert_eq!(s.indicator, IndicatorColor::Motion);
    }

    #[test]
    fn motion_timeout_fires_exactly_on_first_tick_past_window() {
        let timeout = SystemConfig::default().main_light_timeout_ticks;
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.motion = true;
        assert!(arb.arbitrate(&frame, &NO_OVR, 0).main_light);

        // At the timeout boundary the light must still be on.
        assert!(arb.poll(&NO_OVR, timeout).main_light);
        // One tick past, it must be off.
        assert!(!arb.poll(&NO_OVR, timeout + 1).main_light);
    }

    #[test]
    fn motion_timeout_respects_manual_override() {
        let timeout = SystemConfig::default().main_light_timeout_ticks;
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.motion = true;
        let ovr = ManualOverrideSet {
            main_light: true,
            ..NO_OVR
        };
        arb.arbitrate(&frame, &ovr, 0);
        assert!(
            arb.poll(&ovr, timeout + 10_000).main_light,
            "override keeps the light on past the timeout"
        );
    }

    #[test]
    fn scenario_motion_then_timeout() {
        let timeout = SystemConfig::default().main_light_timeout_ticks;
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.motion = true;
        let s = arb.arbitrate(&frame, &NO_OVR, 0);
        assert!(s.main_light);
        assert_eq!(s.indicator, IndicatorColor::Motion);

        let later = arb.poll(&NO_OVR, timeout + 1);
        assert!(!later.main_light);
    }

    #[test]
    fn buzzer_pulse_runs_exactly_its_duration() {
        let pulse = SystemConfig::default().buzzer_pulse_ticks;
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.sound = true;
        assert!(arb.arbitrate(&frame, &NO_OVR, 0).buzzer_pulse_active);

        assert!(arb.poll(&NO_OVR, pulse).buzzer_pulse_active);
        assert!(!arb.poll(&NO_OVR, pulse + 1).buzzer_pulse_active);
    }

    #[test]
    fn buzzer_retrigger_during_pulse_does_not_extend() {
        let cfg = SystemConfig::default();
        let debounce = cfg.debounce_ticks;
        let pulse = debounce * 3; // pulse longer than debounce so a
                                  // second cycle lands mid-pulse
        let mut arb = ActuatorArbiter::new(&SystemConfig {
            buzzer_pulse_ticks: pulse,
            ..cfg
        });

        let mut frame = quiet(0);
        frame.sound = true;
        arb.arbitrate(&frame, &NO_OVR, 0);

        // A second sound cycle mid-pulse must not move the clear time.
        let mut frame2 = quiet(debounce);
        frame2.sound = true;
        arb.arbitrate(&frame2, &NO_OVR, debounce);

        assert!(arb.poll(&NO_OVR, pulse).buzzer_pulse_active);
        assert!(!arb.poll(&NO_OVR, pulse + 1).buzzer_pulse_active);
    }

    #[test]
    fn buzzer_can_retrigger_after_pulse_clears() {
        let cfg = SystemConfig::default();
        let pulse = cfg.buzzer_pulse_ticks;
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.sound = true;
        arb.arbitrate(&frame, &NO_OVR, 0);
        assert!(!arb.poll(&NO_OVR, pulse + 1).buzzer_pulse_active);

        let mut frame2 = quiet(pulse + cfg.debounce_ticks + 1);
        frame2.sound = true;
        let s = arb.arbitrate(&frame2, &NO_OVR, pulse + cfg.debounce_ticks + 1);
        assert!(s.buzzer_pulse_active);
    }

    #[test]
    fn stale_frame_still_produces_a_state() {
        let mut arb = arbiter();
        let mut frame = quiet(0);
        frame.is_valid = false;
        frame.dht_error = true;
        frame.temperature_c = 31.0; // last-known-good cache value
        let s = arb.arbitrate(&frame, &NO_OVR, 0);
        assert!(s.fan, "fallback values run through the same formulas");
    }

    #[test]
    fn restore_seeds_state_for_poll() {
        let mut arb = arbiter();
        arb.restore(
            ActuatorState {
                main_light: true,
                ..ActuatorState::default()
            },
            0,
        );
        assert!(arb.state().main_light);
    }

    #[test]
    fn restored_main_light_times_out_without_fresh_motion() {
        let timeout = SystemConfig::default().main_light_timeout_ticks;
        let mut arb = arbiter();
        arb.restore(
            ActuatorState {
                main_light: true,
                ..ActuatorState::default()
            },
            1000,
        );

        // One full window after boot the light is still on, then off.
        assert!(arb.poll(&NO_OVR, 1000 + timeout).main_light);
        assert!(!arb.poll(&NO_OVR, 1000 + timeout + 1).main_light);
    }

    #[test]
    fn restored_main_light_with_override_stays_on() {
        let timeout = SystemConfig::default().main_light_timeout_ticks;
        let mut arb = arbiter();
        arb.restore(
            ActuatorState {
                main_light: true,
                ..ActuatorState::default()
            },
            0,
        );
        let ovr = ManualOverrideSet {
            main_light: true,
            ..NO_OVR
        };
        assert!(arb.poll(&ovr, timeout * 4).main_light);
    }

    #[test]
    fn toggle_flips_each_target_independently() {
        let mut ovr = ManualOverrideSet::default();
        assert!(ovr.toggle(ToggleTarget::Fan));
        assert!(ovr.fan && !ovr.exhaust && !ovr.room_light && !ovr.main_light);
        assert!(!ovr.toggle(ToggleTarget::Fan));
        assert!(!ovr.fan);
        assert!(ovr.toggle(ToggleTarget::MainLight));
        assert!(ovr.main_light);
    }
}
