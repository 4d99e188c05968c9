//! System configuration parameters
//!
//! All tunable parameters for the hearth system. Values can be
//! overridden via persisted storage (see `adapters::memstore` /
//! `adapters::filestore`) before the control loops start.

use serde::{Deserialize, Serialize};

/// Firmware version reported on the wire and in health snapshots.
pub const FIRMWARE_VERSION: &str = "v1.0.5";

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Arbitration ---
    /// Fan activation temperature (Celsius)
    pub temp_threshold_c: f32,
    /// Minimum interval between committed arbitration updates (ticks)
    pub debounce_ticks: u32,
    /// Main light auto-off timeout after last motion (ticks)
    pub main_light_timeout_ticks: u32,
    /// Buzzer pulse duration once triggered (ticks)
    pub buzzer_pulse_ticks: u32,

    // --- Acquisition ---
    /// DHT read attempts before falling back to the cached value
    pub dht_retry_count: u8,
    /// Delay between DHT retries (milliseconds)
    pub dht_retry_delay_ms: u32,
    /// Analog sound level above which the digital sound flag is forced on
    pub sound_analog_threshold: u16,
    /// Full acquisition cycle interval (milliseconds)
    pub sensor_interval_ms: u32,

    // --- Transport ---
    /// Hub service name, resolved at send time
    pub hub_host: String,
    /// Hub HTTP port (signed update requests)
    pub hub_http_port: u16,
    /// Hub TCP line-ingest port
    pub ingest_port: u16,
    /// Fixed secondary address tried once when the primary connect fails
    pub fallback_addr: String,
    /// Shared-secret token carried in the Authorization header
    pub api_token: String,
    /// How long to wait for a hub response (milliseconds)
    pub response_timeout_ms: u32,

    // --- Persistence ---
    /// Minimum interval between persisted-record writes (ticks)
    pub persist_min_interval_ticks: u32,

    // --- Health ---
    /// Health snapshot interval (seconds)
    pub health_interval_secs: u32,

    // --- Connectivity ---
    /// Reconnection window before a controlled restart (milliseconds)
    pub reconnect_timeout_ms: u32,
}

impl SystemConfig {
    /// Range-check every field. Persisting an invalid config is refused
    /// outright rather than clamped, so a bad write cannot brick the
    /// next boot.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(-40.0..=80.0).contains(&self.temp_threshold_c) {
            return Err("temp_threshold_c out of range");
        }
        if self.debounce_ticks == 0 {
            return Err("debounce_ticks must be nonzero");
        }
        if self.main_light_timeout_ticks <= self.debounce_ticks {
            return Err("main_light_timeout_ticks must exceed debounce_ticks");
        }
        if self.buzzer_pulse_ticks == 0 {
            return Err("buzzer_pulse_ticks must be nonzero");
        }
        if self.dht_retry_count == 0 {
            return Err("dht_retry_count must be at least 1");
        }
        if self.sensor_interval_ms == 0 {
            return Err("sensor_interval_ms must be nonzero");
        }
        if self.hub_host.is_empty() {
            return Err("hub_host must not be empty");
        }
        if self.api_token.is_empty() {
            return Err("api_token must not be empty");
        }
        if self.response_timeout_ms == 0 {
            return Err("response_timeout_ms must be nonzero");
        }
        if self.reconnect_timeout_ms == 0 {
            return Err("reconnect_timeout_ms must be nonzero");
        }
        Ok(())
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Arbitration
            temp_threshold_c: 30.0,
            debounce_ticks: 1000,
            main_light_timeout_ticks: 5 * 60 * 1000, // 5 minutes
            buzzer_pulse_ticks: 500,

            // Acquisition
            dht_retry_count: 3,
            dht_retry_delay_ms: 1000,
            sound_analog_threshold: 300,
            sensor_interval_ms: 5000,

            // Transport
            hub_host: "hearth-hub.local".into(),
            hub_http_port: 80,
            ingest_port: 5000,
            fallback_addr: "192.168.1.100".into(),
            api_token: "changeme123".into(),
            response_timeout_ms: 3000,

            // Persistence
            persist_min_interval_ticks: 10 * 60 * 1000, // 10 minutes

            // Health
            health_interval_secs: 60,

            // Connectivity
            reconnect_timeout_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.temp_threshold_c > 0.0);
        assert!(c.debounce_ticks > 0);
        assert!(c.dht_retry_count >= 1);
        assert!(c.buzzer_pulse_ticks > 0);
        assert!(c.main_light_timeout_ticks > c.debounce_ticks);
        assert!(!c.api_token.is_empty());
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert!((c.temp_threshold_c - c2.temp_threshold_c).abs() < 0.001);
        assert_eq!(c.debounce_ticks, c2.debounce_ticks);
        assert_eq!(c.hub_host, c2.hub_host);
    }

    #[test]
    fn timing_ratios_make_sense() {
        let c = SystemConfig::default();
        assert!(
            c.debounce_ticks <= c.sensor_interval_ms,
            "debounce must not swallow every sensor cycle"
        );
        assert!(
            u64::from(c.persist_min_interval_ticks) > u64::from(c.sensor_interval_ms),
            "persistence must be rarer than acquisition to protect write endurance"
        );
    }

    #[test]
    fn default_config_validates() {
        assert!(SystemConfig::default().validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_ranges() {
        let mut c = SystemConfig::default();
        c.temp_threshold_c = 200.0;
        assert!(c.validate().is_err());

        let mut c = SystemConfig::default();
        c.debounce_ticks = 0;
        assert!(c.validate().is_err());

        let mut c = SystemConfig::default();
        c.api_token = String::new();
        assert!(c.validate().is_err());

        let mut c = SystemConfig::default();
        c.main_light_timeout_ticks = c.debounce_ticks;
        assert!(c.validate().is_err());
    }

    #[test]
    fn postcard_roundtrip() {
        let c = SystemConfig::default();
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: SystemConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c.persist_min_interval_ticks, c2.persist_min_interval_ticks);
        assert!((c.temp_threshold_c - c2.temp_threshold_c).abs() < 0.001);
        assert_eq!(c.api_token, c2.api_token);
    }
}
