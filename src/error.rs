//! Unified error types for the protocol core.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! caller's error handling uniform. All variants are `Copy` so they can be
//! cheaply passed around without allocation. There are no fatal errors in
//! the core: every radio-side failure degrades to "this poll cycle failed,
//! try again next interval".

use core::fmt;

use crate::message::NodeId;

/// Every fallible operation in the protocol core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The node registry is at capacity; the registration was rejected.
    RegistryFull,
    /// A node with this id is already registered.
    DuplicateNode(NodeId),
    /// The id is reserved (controller address or the no-addressee sentinel).
    ReservedNodeId(NodeId),
    /// The link's outbound queue is full; the message was not enqueued.
    TxQueueFull,
    /// Configuration failed validation.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistryFull => write!(f, "node registry full"),
            Self::DuplicateNode(id) => write!(f, "node {id} already registered"),
            Self::ReservedNodeId(id) => write!(f, "node id {id} is reserved"),
            Self::TxQueueFull => write!(f, "link transmit queue full"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
