//! Host-side adapters.
//!
//! Test doubles for the [`crate::ports`] traits: an in-memory shared-medium
//! radio and a `std`-backed monotonic clock. Production firmware supplies
//! its own transceiver driver and clock; everything in here exists so the
//! protocol core can be exercised end-to-end on a development host.

pub mod loopback;
pub mod time;
