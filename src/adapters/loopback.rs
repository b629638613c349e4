//! In-memory shared-medium radio.
//!
//! Models the single half-duplex channel: a frame sent by any attached
//! radio is delivered to every *other* attached radio's inbox (broadcast —
//! address filtering happens at the protocol layer, matching hardware that
//! hands every CRC-clean frame to the driver). Corrupt frames can be
//! injected to exercise the integrity-check drop path.
//!
//! Single-threaded by design, like the cooperative main loop it serves.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::message::NodeId;
use crate::ports::Transceiver;

#[derive(Debug, Clone)]
struct Frame {
    #[allow(dead_code)] // radio-header destination, kept for inspection
    destination: NodeId,
    bytes: Vec<u8>,
    crc_ok: bool,
}

#[derive(Default)]
struct BusInner {
    inboxes: Vec<VecDeque<Frame>>,
}

/// The shared radio channel. Attach one [`LoopbackRadio`] per role.
#[derive(Clone, Default)]
pub struct RadioBus {
    inner: Rc<RefCell<BusInner>>,
}

impl RadioBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new radio to the channel.
    pub fn attach(&self) -> LoopbackRadio {
        let mut inner = self.inner.borrow_mut();
        inner.inboxes.push(VecDeque::new());
        LoopbackRadio {
            bus: Rc::clone(&self.inner),
            index: inner.inboxes.len() - 1,
        }
    }

    /// Deliver a clean frame to every attached radio (scripted traffic).
    pub fn inject_frame(&self, destination: NodeId, bytes: &[u8]) {
        self.deliver_to_all(destination, bytes, true);
    }

    /// Deliver a frame whose integrity check will fail.
    pub fn inject_corrupt_frame(&self, destination: NodeId, bytes: &[u8]) {
        self.deliver_to_all(destination, bytes, false);
    }

    fn deliver_to_all(&self, destination: NodeId, bytes: &[u8], crc_ok: bool) {
        let frame = Frame {
            destination,
            bytes: bytes.to_vec(),
            crc_ok,
        };
        for inbox in &mut self.inner.borrow_mut().inboxes {
            inbox.push_back(frame.clone());
        }
    }
}

/// One attached radio endpoint. Implements [`Transceiver`].
pub struct LoopbackRadio {
    bus: Rc<RefCell<BusInner>>,
    index: usize,
}

impl Transceiver for LoopbackRadio {
    fn receive_ready(&mut self) -> bool {
        !self.bus.borrow().inboxes[self.index].is_empty()
    }

    fn crc_ok(&self) -> bool {
        self.bus.borrow().inboxes[self.index]
            .front()
            .is_some_and(|f| f.crc_ok)
    }

    fn copy_received(&mut self, buf: &mut [u8]) -> usize {
        match self.bus.borrow_mut().inboxes[self.index].pop_front() {
            Some(frame) => {
                let len = frame.bytes.len().min(buf.len());
                buf[..len].copy_from_slice(&frame.bytes[..len]);
                len
            }
            None => 0,
        }
    }

    fn can_send(&mut self) -> bool {
        true
    }

    fn send(&mut self, destination: NodeId, frame: &[u8]) {
        let out = Frame {
            destination,
            bytes: frame.to_vec(),
            crc_ok: true,
        };
        let mut inner = self.bus.borrow_mut();
        for (i, inbox) in inner.inboxes.iter_mut().enumerate() {
            if i != self.index {
                inbox.push_back(out.clone());
            }
        }
    }

    fn wait_send_complete(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_does_not_hear_itself() {
        let bus = RadioBus::new();
        let mut a = bus.attach();
        let mut b = bus.attach();

        a.send(7, &[1, 2, 3]);
        assert!(!a.receive_ready());
        assert!(b.receive_ready());

        let mut buf = [0u8; 8];
        assert_eq!(b.copy_received(&mut buf), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert!(!b.receive_ready());
    }

    #[test]
    fn broadcast_reaches_every_other_radio() {
        let bus = RadioBus::new();
        let mut a = bus.attach();
        let mut b = bus.attach();
        let mut c = bus.attach();

        a.send(7, &[9]);
        assert!(b.receive_ready());
        assert!(c.receive_ready());
    }

    #[test]
    fn injected_corrupt_frame_fails_crc() {
        let bus = RadioBus::new();
        let mut a = bus.attach();

        bus.inject_corrupt_frame(7, &[1, 2]);
        assert!(a.receive_ready());
        assert!(!a.crc_ok());

        let mut buf = [0u8; 8];
        let _ = a.copy_received(&mut buf);
        assert!(!a.receive_ready());
    }
}
