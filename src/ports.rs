//! Port traits — the boundary between the protocol core and the outside
//! world.
//!
//! ```text
//!   Transceiver ──▶ Link ──▶ LinkDelegate (Controller / Responder engine)
//!                                 │
//!                                 ▼
//!                     PollObserver / UpdateProducer (application)
//! ```
//!
//! The radio driver and clock implement the driven side; the application
//! implements the observer/producer side. The core never touches hardware
//! directly, which keeps the whole protocol testable with the in-memory
//! adapters in [`crate::adapters`].

use crate::message::{Message, NodeId};
use crate::time::Instant;

// ───────────────────────────────────────────────────────────────
// Transceiver port (driven adapter: radio hardware → link)
// ───────────────────────────────────────────────────────────────

/// Half-duplex radio transceiver driver.
///
/// The link never blocks on this interface beyond the hardware's own
/// synchronous send path ([`wait_send_complete`](Self::wait_send_complete)),
/// and never accesses it more often than the configured service interval.
pub trait Transceiver {
    /// A received frame is waiting to be read.
    fn receive_ready(&mut self) -> bool;

    /// Integrity check result for the waiting frame.
    /// Only meaningful while [`receive_ready`](Self::receive_ready) is true.
    fn crc_ok(&self) -> bool;

    /// Copy the waiting frame into `buf` and release the receive buffer.
    /// Returns the frame length (0 if nothing was waiting).
    fn copy_received(&mut self, buf: &mut [u8]) -> usize;

    /// The channel is clear and the transmitter can accept a frame.
    fn can_send(&mut self) -> bool;

    /// Start transmitting a frame to `destination`.
    fn send(&mut self, destination: NodeId, frame: &[u8]);

    /// Block until the in-flight transmission has left the air.
    fn wait_send_complete(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock supplied by the host platform.
pub trait Clock {
    fn now(&self) -> Instant;
}

// ───────────────────────────────────────────────────────────────
// Link delegate (capability interface for receive/timeout)
// ───────────────────────────────────────────────────────────────

/// The single capability interface the link invokes without knowing which
/// role (controller or responder engine) implements it.
///
/// `on_receive` returns a [`LinkDirective`] telling the link how the
/// exchange state should change; the link applies it itself. This replaces
/// a callback that would otherwise need to re-enter the link mid-service.
pub trait LinkDelegate {
    /// A CRC-clean, decodable frame arrived.
    fn on_receive(&mut self, now: Instant, msg: &Message) -> LinkDirective;

    /// The response window closed without the exchange completing.
    /// `rx_pending` has already been cleared when this fires.
    fn on_timeout(&mut self, now: Instant);
}

/// Exchange-state change requested by [`LinkDelegate::on_receive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirective {
    /// No change to the exchange state.
    None,
    /// Re-arm the response deadline (a multi-packet sequence is alive).
    ResetDeadline,
    /// The expected reply sequence has been fully observed; clear
    /// `rx_pending` without firing the timeout.
    CompleteExchange,
}

// ───────────────────────────────────────────────────────────────
// Application callbacks
// ───────────────────────────────────────────────────────────────

/// Controller-side application notifications.
pub trait PollObserver {
    /// A sensor reading arrived from the node currently being polled.
    fn on_sensor_update(&mut self, node_id: NodeId, sensor_id: u8, reading: u8);

    /// The node currently being polled never completed its update; the poll
    /// was abandoned and the node rescheduled.
    fn on_update_timeout(&mut self, node_id: NodeId);
}

/// Node-side application callback: produce sensor readings on demand.
pub trait UpdateProducer {
    /// Called when the controller polls this node. The implementation calls
    /// [`send_sensor_byte`](crate::node::UpdateWriter::send_sensor_byte)
    /// zero or more times and finally
    /// [`mark_update_complete`](crate::node::UpdateWriter::mark_update_complete).
    fn on_update_needed(&mut self, update: &mut crate::node::UpdateWriter);
}
