//! Application-level port traits shared by both units.

pub mod ports;
