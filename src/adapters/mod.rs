//! Concrete implementations of the port traits.
//!
//! - [`memstore`] / [`filestore`]: storage and config backends
//! - [`clock`]: monotonic and manually-driven tick sources
//! - [`sim`]: simulated sensor bus, relay board, and network link

pub mod clock;
pub mod filestore;
pub mod memstore;
pub mod sim;

pub use clock::{ManualClock, MonotonicClock};
pub use filestore::FileStore;
pub use memstore::MemStore;
