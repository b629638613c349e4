//! Bounded node registry (controller-only).
//!
//! Each entry carries an independent poll interval and a next-due time.
//! The schedule is drifting, not fixed-rate: the due time is recomputed as
//! `now + interval` every time a poll resolves, so overrun polls simply
//! push the schedule later. Entries are never removed in the core —
//! deregistration stays a wire-level extension point.

use heapless::Vec;
use log::info;

use crate::error::{Error, Result};
use crate::message::{CONTROLLER_NODE_ID, NO_NODE, NodeId};
use crate::time::{DurationMs, Instant, after, deadline_passed};

/// Fixed maximum node count. Bounded by channel throughput, not memory:
/// every node shares one half-duplex poll cycle.
pub const MAX_NODES: usize = 8;

/// One registered node's schedule.
#[derive(Debug, Clone, Copy)]
pub struct NodeEntry {
    pub node_id: NodeId,
    pub poll_interval_ms: DurationMs,
    pub next_poll_due: Instant,
}

/// Registration-ordered, fixed-capacity registry of known nodes.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    entries: Vec<NodeEntry, MAX_NODES>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node and schedule its first poll at `now + interval`.
    ///
    /// Rejects (never overflows into adjacent state): a full registry,
    /// duplicate ids, reserved ids, and a zero interval.
    pub fn register(
        &mut self,
        node_id: NodeId,
        poll_interval_ms: DurationMs,
        now: Instant,
    ) -> Result<()> {
        if node_id == NO_NODE || node_id == CONTROLLER_NODE_ID {
            return Err(Error::ReservedNodeId(node_id));
        }
        if poll_interval_ms == 0 {
            return Err(Error::Config("poll interval must be non-zero"));
        }
        if self.entries.iter().any(|e| e.node_id == node_id) {
            return Err(Error::DuplicateNode(node_id));
        }
        let entry = NodeEntry {
            node_id,
            poll_interval_ms,
            next_poll_due: after(now, poll_interval_ms),
        };
        self.entries.push(entry).map_err(|_| Error::RegistryFull)?;
        info!("registry: node {node_id} registered, interval {poll_interval_ms} ms");
        Ok(())
    }

    /// First node (in registration order) whose poll is due.
    /// First-due-first-served, not priority-sorted.
    pub fn next_due(&self, now: Instant) -> Option<NodeId> {
        self.entries
            .iter()
            .find(|e| deadline_passed(now, e.next_poll_due))
            .map(|e| e.node_id)
    }

    /// Push the node's schedule to `now + interval`. Called once per poll
    /// resolution, success or timeout.
    pub fn reschedule(&mut self, node_id: NodeId, now: Instant) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.node_id == node_id) {
            entry.next_poll_due = after(now, entry.poll_interval_ms);
        }
    }

    /// The node's currently scheduled due time.
    pub fn next_poll_due(&self, node_id: NodeId) -> Option<Instant> {
        self.entries
            .iter()
            .find(|e| e.node_id == node_id)
            .map(|e| e.next_poll_due)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
