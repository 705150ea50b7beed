//! Fake link implementation for testing and development
//!
//! Plays the role of the I/O tasks against a router without hardware: a
//! test injects what the peer "sent" (as lines or raw bytes through the
//! framer) and drains what the firmware side enqueued for transmission.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use log::warn;

use crate::framing::LineFramer;
use crate::message_router::MessageRouter;

/// In-memory stand-in for one link's UART side.
pub struct FakeLink {
    router: MessageRouter,
    framer: LineFramer,
    rx_drops: u32,
}

impl FakeLink {
    pub fn new(router: MessageRouter) -> Self {
        Self {
            router,
            framer: LineFramer::new(),
            rx_drops: 0,
        }
    }

    /// Simulate the peer sending one complete line.
    pub fn inject_line(&mut self, line: &str) {
        if self.router.push_incoming(String::from(line)).is_err() {
            self.rx_drops = self.rx_drops.wrapping_add(1);
            warn!("inbound queue full, line dropped ({} so far)", self.rx_drops);
        }
    }

    /// Simulate raw bytes arriving on the wire, complete or not.
    pub fn inject_bytes(&mut self, bytes: &[u8]) {
        let router = self.router;
        let mut dropped = 0u32;
        self.framer.push_bytes(bytes, |line| {
            if router.push_incoming(line).is_err() {
                dropped += 1;
            }
        });
        if dropped > 0 {
            self.rx_drops = self.rx_drops.wrapping_add(dropped);
            warn!("inbound queue full, {} lines dropped ({} so far)", dropped, self.rx_drops);
        }
    }

    /// Drain everything the firmware side has queued for transmission.
    pub fn drain_outbound(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.router.try_receive_outgoing() {
            lines.push(line);
        }
        lines
    }

    /// Inbound lines dropped by a full queue.
    pub fn rx_drops(&self) -> u32 {
        self.rx_drops
    }

    /// Partial lines discarded by the framer.
    pub fn overflows(&self) -> u32 {
        self.framer.overflows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_bytes_frames_lines() {
        let router = MessageRouter::leaked();
        let mut link = FakeLink::new(router);

        link.inject_bytes(b"partial");
        assert!(router.receive_all().is_empty());

        link.inject_bytes(b" line\nnext\n");
        assert_eq!(router.receive_all(), ["partial line", "next"]);
    }

    #[test]
    fn test_drain_outbound() {
        let router = MessageRouter::leaked();
        let mut link = FakeLink::new(router);

        router.send(String::from("out1")).unwrap();
        router.send(String::from("out2")).unwrap();
        assert_eq!(link.drain_outbound(), ["out1", "out2"]);
        assert!(link.drain_outbound().is_empty());
    }

    #[test]
    fn test_full_inbound_queue_drops() {
        let router = MessageRouter::leaked();
        let mut link = FakeLink::new(router);

        for _ in 0..crate::message_router::QUEUE_DEPTH {
            link.inject_line("line");
        }
        assert_eq!(link.rx_drops(), 0);
        link.inject_line("one too many");
        assert_eq!(link.rx_drops(), 1);
    }
}
