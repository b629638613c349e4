//! SensorNet protocol core.
//!
//! A master/node polling protocol for small wireless sensor networks on a
//! single shared half-duplex radio channel. One [`Controller`] sequentially
//! polls a bounded set of [`Responder`] nodes; each responds with zero or
//! more sensor updates followed by a completion signal. Everything is driven
//! by a periodic, non-blocking `heartbeat()` — no threads, no blocking I/O.
//!
//! The physical transceiver and the monotonic clock are consumed through the
//! port traits in [`ports`]; host-side test doubles live in [`adapters`].
//!
//! [`Controller`]: controller::Controller
//! [`Responder`]: node::Responder

#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod controller;
pub mod error;
pub mod link;
pub mod message;
pub mod node;
pub mod ports;
pub mod registry;
pub mod time;

pub use config::ProtocolConfig;
pub use controller::Controller;
pub use error::{Error, Result};
pub use message::{Message, MessageKind, NodeId};
pub use node::Responder;
