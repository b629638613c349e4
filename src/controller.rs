//! Bus-master role: schedules and drives one poll at a time.
//!
//! The controller owns the node registry and a private [`Link`] (it is
//! itself the addressable master node on the channel). Observable states:
//!
//! ```text
//!            first due node            UpdateComplete / timeout
//!   Idle ──────────────────▶ Polling ──────────────────────────▶ Idle
//!   (active = None,          (active = Some(n),
//!    link not busy)           link busy, reply expected)
//! ```
//!
//! No other transitions exist. At most one node is ever active — the
//! central mutual-exclusion invariant of the whole system. Inbound frames
//! are correlated against the active node's address; stray or misaddressed
//! frames are counted and ignored, never dispatched.

use heapless::Vec;
use log::{debug, info, warn};

use crate::config::ProtocolConfig;
use crate::error::Result;
use crate::link::{Link, LinkStats};
use crate::message::{Message, MessageKind, NodeId};
use crate::ports::{LinkDelegate, LinkDirective, PollObserver, Transceiver};
use crate::registry::NodeRegistry;
use crate::time::{DurationMs, Instant};

/// Pending observer notifications buffered during one heartbeat.
/// A node can contribute at most one frame per radio service window, so
/// this never holds more than a couple of entries in practice.
const EVENT_BUF_CAP: usize = 8;

/// Running counters for the polling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub polls_started: u64,
    pub polls_completed: u64,
    pub polls_timed_out: u64,
    /// Frames ignored because they did not belong to the active exchange.
    pub stray_frames: u64,
    /// Observer notifications lost to a full event buffer.
    pub events_dropped: u64,
}

#[derive(Debug, Clone, Copy)]
enum PollEvent {
    SensorUpdate {
        node_id: NodeId,
        sensor_id: u8,
        reading: u8,
    },
    PollTimedOut {
        node_id: NodeId,
    },
}

/// The bus-master role.
pub struct Controller<R: Transceiver> {
    link: Link<R>,
    engine: PollEngine,
    polling_enabled: bool,
}

impl<R: Transceiver> Controller<R> {
    /// Construct a controller over the given radio. Fails on an invalid
    /// configuration.
    pub fn new(radio: R, config: &ProtocolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            link: Link::new(radio, config),
            engine: PollEngine::new(),
            polling_enabled: true,
        })
    }

    /// Register a node with its own poll interval. Its first poll comes due
    /// at `now + interval`.
    pub fn register_node(
        &mut self,
        node_id: NodeId,
        poll_interval_ms: DurationMs,
        now: Instant,
    ) -> Result<()> {
        self.engine.registry.register(node_id, poll_interval_ms, now)
    }

    /// Suspend or resume starting new polls. An in-flight poll still
    /// resolves normally; only the scheduling of new ones is gated.
    pub fn set_polling_enabled(&mut self, enabled: bool) {
        if self.polling_enabled != enabled {
            info!("controller: polling {}", if enabled { "resumed" } else { "suspended" });
        }
        self.polling_enabled = enabled;
    }

    /// The node currently owning the link's attention, if any.
    pub fn active_node(&self) -> Option<NodeId> {
        self.engine.active
    }

    /// The node's currently scheduled due time.
    pub fn next_poll_due(&self, node_id: NodeId) -> Option<Instant> {
        self.engine.registry.next_poll_due(node_id)
    }

    pub fn stats(&self) -> PollStats {
        self.engine.stats
    }

    pub fn link_stats(&self) -> LinkStats {
        self.link.stats()
    }

    /// The single driving entry point; call at the application's cadence.
    ///
    /// 1. If the link is idle, start a poll for the first due node (at most
    ///    one poll starts per tick).
    /// 2. Service the radio and the timeout path.
    /// 3. Deliver buffered notifications to the observer.
    pub fn heartbeat(&mut self, now: Instant, observer: &mut impl PollObserver) {
        if self.polling_enabled && !self.link.is_busy() {
            if let Some(node_id) = self.engine.registry.next_due(now) {
                self.begin_poll(node_id, now);
            }
        }

        self.link.service(now, &mut self.engine);
        self.link.check_timeout(now, &mut self.engine);

        for event in core::mem::take(&mut self.engine.events) {
            match event {
                PollEvent::SensorUpdate {
                    node_id,
                    sensor_id,
                    reading,
                } => observer.on_sensor_update(node_id, sensor_id, reading),
                PollEvent::PollTimedOut { node_id } => observer.on_update_timeout(node_id),
            }
        }
    }

    fn begin_poll(&mut self, node_id: NodeId, now: Instant) {
        debug_assert!(self.engine.active.is_none());
        let msg = Message {
            node_id,
            kind: MessageKind::SendUpdate,
        };
        match self.link.queue_send_expecting_reply(msg, now) {
            Ok(()) => {
                self.engine.active = Some(node_id);
                self.engine.stats.polls_started += 1;
                debug!("controller: polling node {node_id} at {now}");
            }
            Err(e) => {
                // Unreachable while the not-busy precondition holds; the
                // node keeps its due time and is retried next heartbeat.
                warn!("controller: failed to start poll of node {node_id}: {e}");
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Poll engine — the controller's LinkDelegate half
// ───────────────────────────────────────────────────────────────

/// Registry, active-node marker and event buffer, split from the link so
/// the link can borrow it as its delegate during `service()`.
struct PollEngine {
    registry: NodeRegistry,
    active: Option<NodeId>,
    events: Vec<PollEvent, EVENT_BUF_CAP>,
    stats: PollStats,
}

impl PollEngine {
    fn new() -> Self {
        Self {
            registry: NodeRegistry::new(),
            active: None,
            events: Vec::new(),
            stats: PollStats::default(),
        }
    }

    /// Reschedule the finished node and return to idle. The one and only
    /// cancellation primitive; final, success or timeout alike.
    fn end_poll(&mut self, now: Instant) -> Option<NodeId> {
        let node_id = self.active.take()?;
        self.registry.reschedule(node_id, now);
        Some(node_id)
    }

    fn push_event(&mut self, event: PollEvent) {
        if self.events.push(event).is_err() {
            self.stats.events_dropped += 1;
            warn!("controller: observer event buffer full, notification dropped");
        }
    }
}

impl LinkDelegate for PollEngine {
    fn on_receive(&mut self, now: Instant, msg: &Message) -> LinkDirective {
        // Hardened correlation: only frames from the active node, while a
        // poll is active, are dispatched.
        let Some(active) = self.active else {
            self.stats.stray_frames += 1;
            debug!("controller: ignoring frame from node {} while idle", msg.node_id);
            return LinkDirective::None;
        };
        if msg.node_id != active {
            self.stats.stray_frames += 1;
            debug!(
                "controller: ignoring misaddressed frame from node {} (active: {active})",
                msg.node_id
            );
            return LinkDirective::None;
        }

        match msg.kind {
            MessageKind::UpdateSensor { sensor_id, reading } => {
                // Liveness signal: the node is mid-sequence, keep waiting.
                self.push_event(PollEvent::SensorUpdate {
                    node_id: active,
                    sensor_id,
                    reading,
                });
                LinkDirective::ResetDeadline
            }
            MessageKind::UpdateComplete => {
                self.stats.polls_completed += 1;
                let _ = self.end_poll(now);
                debug!("controller: poll of node {active} complete at {now}");
                LinkDirective::CompleteExchange
            }
            _ => {
                self.stats.stray_frames += 1;
                debug!(
                    "controller: unexpected {:?} from active node {active}",
                    msg.kind
                );
                LinkDirective::None
            }
        }
    }

    fn on_timeout(&mut self, now: Instant) {
        // The schedule advances even on failure: a silent node loses this
        // cycle, it does not stall the system.
        if let Some(node_id) = self.end_poll(now) {
            self.stats.polls_timed_out += 1;
            warn!("controller: node {node_id} did not respond, poll abandoned at {now}");
            self.push_event(PollEvent::PollTimedOut { node_id });
        }
    }
}
