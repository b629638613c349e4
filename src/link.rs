//! Half-duplex link state machine.
//!
//! One [`Link`] per role mediates all radio traffic and owns the single
//! in-flight-request/timeout contract:
//!
//! ```text
//! queue_send ──▶ ┌──────────────────────────┐ ──▶ Transceiver.send
//!                │   Link                    │
//!                │   tx queue · rx_pending   │
//! on_receive ◀── │   rx_deadline · throttle  │ ◀── Transceiver.receive
//! on_timeout ◀── └──────────────────────────┘
//! ```
//!
//! `service()` is non-blocking and rate-limited: the physical transceiver
//! is touched at most once per configured service interval no matter how
//! often the heartbeat runs. `check_timeout()` is the *only* release path
//! for a stuck exchange — there is no retry and no backoff; one missed
//! response equals one failed poll cycle.

use heapless::Deque;
use log::{debug, warn};

use crate::config::ProtocolConfig;
use crate::error::{Error, Result};
use crate::message::{MAX_FRAME_LEN, Message};
use crate::ports::{LinkDelegate, LinkDirective, Transceiver};
use crate::time::{DurationMs, Instant, after, deadline_passed};

/// Outbound queue depth. Sized for one full node update sequence
/// (sensor readings plus the completion marker).
pub const TX_QUEUE_CAP: usize = 8;

/// Running counters for the radio path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// CRC-clean, decodable frames handed to the delegate.
    pub frames_received: u64,
    /// Frames dropped for bad CRC or undecodable contents.
    pub frames_discarded: u64,
    /// Frames handed to the transmitter.
    pub frames_sent: u64,
    /// Response windows that closed without completion.
    pub timeouts: u64,
}

/// Per-role half-duplex link over one shared radio channel.
pub struct Link<R: Transceiver> {
    radio: R,
    tx_queue: Deque<Message, TX_QUEUE_CAP>,
    rx_pending: bool,
    rx_deadline: Instant,
    response_timeout: DurationMs,
    service_interval: DurationMs,
    /// Radio-access throttle. `None` until the first `service()`.
    next_service_at: Option<Instant>,
    stats: LinkStats,
}

impl<R: Transceiver> Link<R> {
    pub fn new(radio: R, config: &ProtocolConfig) -> Self {
        Self {
            radio,
            tx_queue: Deque::new(),
            rx_pending: false,
            rx_deadline: 0,
            response_timeout: config.response_timeout_ms,
            service_interval: config.radio_service_interval_ms,
            next_service_at: None,
            stats: LinkStats::default(),
        }
    }

    /// True iff an outbound send is queued or an inbound response is still
    /// awaited. Callers must not start a new exchange while this holds.
    pub fn is_busy(&self) -> bool {
        !self.tx_queue.is_empty() || self.rx_pending
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Enqueue an outbound message (fire-and-forget). Actual transmission
    /// happens on a later `service()` once the transceiver accepts a send.
    pub fn queue_send(&mut self, msg: Message) -> Result<()> {
        self.tx_queue.push_back(msg).map_err(|_| Error::TxQueueFull)
    }

    /// Enqueue an outbound message and arm the response window. Used
    /// exactly when a reply is semantically expected (a poll).
    pub fn queue_send_expecting_reply(&mut self, msg: Message, now: Instant) -> Result<()> {
        self.queue_send(msg)?;
        self.rx_pending = true;
        self.reset_rx_deadline(now);
        Ok(())
    }

    /// Re-arm the response deadline to `now + response_timeout`.
    pub fn reset_rx_deadline(&mut self, now: Instant) {
        self.rx_deadline = after(now, self.response_timeout);
    }

    /// The expected reply sequence has been fully observed; release the
    /// exchange without firing the timeout callback.
    pub fn complete_exchange(&mut self) {
        self.rx_pending = false;
    }

    /// Service the physical radio: receive then transmit, at most once per
    /// service interval. Invocations inside the throttle window are no-ops.
    pub fn service(&mut self, now: Instant, delegate: &mut dyn LinkDelegate) {
        if self.next_service_at.is_some_and(|at| !deadline_passed(now, at)) {
            return;
        }
        self.next_service_at = Some(after(now, self.service_interval));

        self.service_receive(now, delegate);
        self.service_transmit();
    }

    /// Fire the timeout path if the response window has closed. Not
    /// throttled — a stuck exchange must never outlive its deadline by more
    /// than one heartbeat.
    pub fn check_timeout(&mut self, now: Instant, delegate: &mut dyn LinkDelegate) {
        if self.rx_pending && deadline_passed(now, self.rx_deadline) {
            self.rx_pending = false;
            self.stats.timeouts += 1;
            debug!("link: response window closed at {now}");
            delegate.on_timeout(now);
        }
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn service_receive(&mut self, now: Instant, delegate: &mut dyn LinkDelegate) {
        if !self.radio.receive_ready() {
            return;
        }

        let mut buf = [0u8; MAX_FRAME_LEN];
        if !self.radio.crc_ok() {
            // Release the receive buffer, keep all protocol state untouched.
            let _ = self.radio.copy_received(&mut buf);
            self.stats.frames_discarded += 1;
            debug!("link: dropped frame with bad CRC");
            return;
        }

        let len = self.radio.copy_received(&mut buf);
        match Message::from_frame(&buf[..len]) {
            Ok(msg) => {
                self.stats.frames_received += 1;
                match delegate.on_receive(now, &msg) {
                    LinkDirective::None => {}
                    LinkDirective::ResetDeadline => self.reset_rx_deadline(now),
                    LinkDirective::CompleteExchange => self.complete_exchange(),
                }
            }
            Err(e) => {
                self.stats.frames_discarded += 1;
                debug!("link: undecodable frame ({len} bytes): {e:?}");
            }
        }
    }

    fn service_transmit(&mut self) {
        if self.tx_queue.is_empty() || !self.radio.can_send() {
            return;
        }
        // Queue is non-empty, checked above.
        let Some(msg) = self.tx_queue.pop_front() else {
            return;
        };
        match msg.to_frame() {
            Ok(frame) => {
                self.radio.send(msg.node_id, &frame);
                self.radio.wait_send_complete();
                self.stats.frames_sent += 1;
            }
            Err(e) => {
                warn!("link: failed to encode outbound message: {e:?}");
            }
        }
    }
}
