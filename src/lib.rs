//! Hearth control firmware library.
//!
//! One crate covers both units of the system: the sensor node
//! (acquisition + telemetry transport) and the control hub (actuator
//! arbitration + persistence + web/ingest endpoints). All hardware and
//! socket access sits behind port traits so the decision core is fully
//! testable on the host.

#![deny(unused_must_use)]

pub mod app;
pub mod arbiter;
pub mod config;
pub mod connectivity;
pub mod frame;
pub mod health;
pub mod hub;
pub mod indicator;
pub mod persist;
pub mod sensors;
pub mod ticks;
pub mod transport;

mod error;

pub mod adapters;

pub use error::{
    AuthError, ConnectivityError, Error, PersistError, Result, SensorError, TransportError,
};
