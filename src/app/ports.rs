//! Port traits: the boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ domain (sensors / arbiter / persist)
//! ```
//!
//! Driven adapters (sensor bus, relay board, storage, clock) implement
//! these traits. The domain consumes them via generics, so the decision
//! core never touches GPIO or sockets directly.

use crate::arbiter::IndicatorColor;
use crate::config::SystemConfig;
use crate::ticks::Ticks;

// ───────────────────────────────────────────────────────────────
// Sensor bus (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw channel reads for the acquisition layer. One call per channel per
/// cycle; retry and fallback policy live above this trait.
pub trait SensorBus {
    /// One DHT read attempt. `None` when the sensor returned NaN or a
    /// bus error; range plausibility is checked by the caller.
    fn read_dht(&mut self) -> Option<(f32, f32)>;

    /// PIR motion line.
    fn read_motion(&mut self) -> bool;

    /// Gas detector digital line (already active-high at this boundary).
    fn read_gas(&mut self) -> bool;

    /// Sound detector digital line.
    fn read_sound(&mut self) -> bool;

    /// Sound detector analog level (0–1023).
    fn read_sound_level(&mut self) -> u16;

    /// IR proximity line.
    fn read_ir(&mut self) -> bool;

    /// Single ultrasonic ranging sample in cm; 0 = no echo.
    fn ping_distance_cm(&mut self) -> u32;

    /// Block for `ms` milliseconds between DHT retry attempts.
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Relay board (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the hub applies each arbitration result through this.
pub trait RelayPort {
    fn set_fan(&mut self, on: bool);
    fn set_exhaust(&mut self, on: bool);
    fn set_room_light(&mut self, on: bool);
    fn set_main_light(&mut self, on: bool);
    fn set_buzzer(&mut self, on: bool);
    fn set_indicator(&mut self, colour: IndicatorColor);
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic tick source for the control loops.
pub trait Clock {
    fn now(&self) -> Ticks;
}

// ───────────────────────────────────────────────────────────────
// Platform metrics (health snapshots)
// ───────────────────────────────────────────────────────────────

/// Read-only platform metrics sampled by the health monitor.
pub trait PlatformInfoPort {
    /// Radio signal strength in dBm, when a radio is present.
    fn signal_dbm(&self) -> Option<i8>;

    /// Free heap in bytes.
    fn free_heap_bytes(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Connectivity (driven adapter: domain ↔ network link)
// ───────────────────────────────────────────────────────────────

/// Link-state port consumed by the reconnection watchdog.
pub trait ConnectivityPort {
    /// Current link state.
    fn is_connected(&mut self) -> bool;

    /// Kick off a reconnection attempt (non-blocking).
    fn reconnect(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting;
/// invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (domain ↔ durable key-value blobs)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for the persisted record and config.
///
/// Keys are namespaced to prevent collisions between subsystems.
/// Write operations MUST be atomic; no partial blobs after power loss.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage medium is full.
    Full,
    /// Generic I/O error.
    IoError,
    /// Destination buffer too small for the stored blob.
    BufferTooSmall,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}
