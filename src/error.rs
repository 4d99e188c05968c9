//! Unified error types for the hearth firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the top-level control loop's error handling uniform. All variants are
//! `Copy` so they can be passed through the health monitor and loop
//! without allocation.
//!
//! Only `Connectivity(ReconnectTimeout)` is ever fatal to the process;
//! every other fault family is recovered at the layer that raised it and
//! surfaced as a flag or a skipped delivery.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor channel could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// A telemetry delivery attempt failed.
    Transport(TransportError),
    /// An inbound request failed authentication or validation.
    Auth(AuthError),
    /// A persistence commit or load failed.
    Persist(PersistError),
    /// Sustained network loss.
    Connectivity(ConnectivityError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Auth(e) => write!(f, "auth: {e}"),
            Self::Persist(e) => write!(f, "persist: {e}"),
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor faults; recovered locally via fallback cache / sentinel values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// DHT read failed after all retries (NaN or out of plausible range).
    DhtReadFailed,
    /// Ultrasonic ranging returned no echo.
    UltrasonicNoEcho,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DhtReadFailed => write!(f, "DHT read failed"),
            Self::UltrasonicNoEcho => write!(f, "ultrasonic no echo"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Transport faults; retried once via the fallback endpoint, then skipped
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Could not connect to either the primary or fallback endpoint.
    ConnectFailed,
    /// No response arrived within the bounded window.
    ResponseTimeout,
    /// The response arrived but was not a success status.
    BadResponse,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::ResponseTimeout => write!(f, "response timeout"),
            Self::BadResponse => write!(f, "bad response"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Auth faults; rejected with an error response, local state untouched
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// The Authorization token did not match the shared secret.
    TokenMismatch,
    /// Request body was absent or not valid JSON.
    MalformedBody,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenMismatch => write!(f, "token mismatch"),
            Self::MalformedBody => write!(f, "malformed body"),
        }
    }
}

impl From<AuthError> for Error {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

// ---------------------------------------------------------------------------
// Persistence faults; reported via health state, never block actuators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistError {
    /// The storage backend refused the write.
    CommitFailed,
    /// Stored record failed the marker or range check.
    Corrupted,
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommitFailed => write!(f, "commit failed"),
            Self::Corrupted => write!(f, "record corrupted"),
        }
    }
}

impl From<PersistError> for Error {
    fn from(e: PersistError) -> Self {
        Self::Persist(e)
    }
}

// ---------------------------------------------------------------------------
// Connectivity faults; escalate to a controlled restart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    /// The reconnection window elapsed without regaining the link.
    ReconnectTimeout,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReconnectTimeout => write!(f, "reconnect timeout"),
        }
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
