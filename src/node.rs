//! Responder role: a sensor node's side of the exchange.
//!
//! A responder embeds its own [`Link`] configured with its own address and
//! only reacts: when a `SendUpdate` poll addressed to it arrives, the
//! application's [`UpdateProducer`] is invoked with an [`UpdateWriter`] to
//! collect readings, and the resulting `UpdateSensor` frames plus the
//! `UpdateComplete` marker are queued fire-and-forget — the node never
//! awaits an acknowledgement, so its timeout callback is a no-op. The
//! controller owns all timeout consequences.

use heapless::Vec;
use log::{debug, warn};

use crate::config::ProtocolConfig;
use crate::error::{Error, Result};
use crate::link::{Link, LinkStats, TX_QUEUE_CAP};
use crate::message::{CONTROLLER_NODE_ID, Message, MessageKind, NO_NODE, NodeId};
use crate::ports::{LinkDelegate, LinkDirective, Transceiver, UpdateProducer};
use crate::time::Instant;

/// Collects one poll's worth of outbound messages.
///
/// Handed to [`UpdateProducer::on_update_needed`]; the producer calls
/// [`send_sensor_byte`](Self::send_sensor_byte) zero or more times and
/// finally [`mark_update_complete`](Self::mark_update_complete). All replies
/// carry the node's own address so the controller can correlate them.
pub struct UpdateWriter {
    node_id: NodeId,
    messages: Vec<Message, TX_QUEUE_CAP>,
    completed: bool,
}

impl UpdateWriter {
    fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            messages: Vec::new(),
            completed: false,
        }
    }

    /// Queue one sensor reading. Readings after
    /// [`mark_update_complete`](Self::mark_update_complete) or beyond the
    /// buffer's capacity are dropped with a warning — the completion marker
    /// always keeps a reserved slot.
    pub fn send_sensor_byte(&mut self, sensor_id: u8, reading: u8) {
        if self.completed {
            warn!("node {}: reading after completion ignored", self.node_id);
            return;
        }
        if self.messages.len() >= self.messages.capacity() - 1 {
            warn!("node {}: update buffer full, reading dropped", self.node_id);
            return;
        }
        let msg = Message {
            node_id: self.node_id,
            kind: MessageKind::UpdateSensor { sensor_id, reading },
        };
        // Capacity checked above.
        let _ = self.messages.push(msg);
    }

    /// Queue the completion marker. Idempotent.
    pub fn mark_update_complete(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let msg = Message {
            node_id: self.node_id,
            kind: MessageKind::UpdateComplete,
        };
        // One slot is always reserved for this marker.
        let _ = self.messages.push(msg);
    }
}

/// The responder role.
pub struct Responder<R: Transceiver> {
    link: Link<R>,
    node_id: NodeId,
    engine: ResponderEngine,
}

impl<R: Transceiver> Responder<R> {
    /// Construct a responder with its own channel address. Fails on an
    /// invalid configuration or a reserved address.
    pub fn new(radio: R, node_id: NodeId, config: &ProtocolConfig) -> Result<Self> {
        config.validate()?;
        if node_id == NO_NODE || node_id == CONTROLLER_NODE_ID {
            return Err(Error::ReservedNodeId(node_id));
        }
        Ok(Self {
            link: Link::new(radio, config),
            node_id,
            engine: ResponderEngine {
                node_id,
                update_requested: false,
            },
        })
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn link_stats(&self) -> LinkStats {
        self.link.stats()
    }

    /// The single driving entry point; call at the application's cadence.
    /// Services the link exactly like the controller does, then answers a
    /// pending poll by invoking the producer.
    pub fn heartbeat(&mut self, now: Instant, producer: &mut impl UpdateProducer) {
        self.link.service(now, &mut self.engine);
        self.link.check_timeout(now, &mut self.engine);

        if core::mem::take(&mut self.engine.update_requested) {
            let mut update = UpdateWriter::new(self.node_id);
            producer.on_update_needed(&mut update);
            if !update.completed {
                warn!(
                    "node {}: producer did not mark the update complete",
                    self.node_id
                );
            }
            for msg in update.messages {
                if let Err(e) = self.link.queue_send(msg) {
                    warn!("node {}: dropping reply: {e}", self.node_id);
                    break;
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Responder engine — the node's LinkDelegate half
// ───────────────────────────────────────────────────────────────

struct ResponderEngine {
    node_id: NodeId,
    update_requested: bool,
}

impl LinkDelegate for ResponderEngine {
    fn on_receive(&mut self, _now: Instant, msg: &Message) -> LinkDirective {
        if msg.node_id == self.node_id && matches!(msg.kind, MessageKind::SendUpdate) {
            debug!("node {}: polled", self.node_id);
            self.update_requested = true;
        }
        LinkDirective::None
    }

    fn on_timeout(&mut self, _now: Instant) {
        // A responder never arms a response window; nothing to recover.
    }
}
