//! Message router for decoupling the engine loop from I/O
//!
//! Provides the bounded-queue handoff between tasks: I/O tasks push
//! completed inbound lines and drain outbound lines, the engine loop does
//! the reverse. Every operation is non-blocking; a full queue drops the
//! message at the producer, it never stalls a reader or a writer.

extern crate alloc;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TryReceiveError, TrySendError};
use log::warn;
use st_model::MAX_MESSAGE_LENGTH;
use st_shared::{MessageSink, TransportError};

/// Queue depth of each direction.
pub const QUEUE_DEPTH: usize = 32;

/// One dropped-message warning per this many drops.
const DROP_WARN_EVERY: u32 = 16;

/// A bounded line queue between two tasks.
pub type LineChannel = Channel<CriticalSectionRawMutex, String, QUEUE_DEPTH>;

/// Cheap view over one link's pair of line queues.
///
/// `incoming` carries completed lines from the RX task to the dispatch
/// side; `outgoing` carries lines from producers to the TX task. The
/// channels are `'static` (usually `static` items; tests leak a pair), so
/// copies of the router can live in every task that touches the link.
#[derive(Clone, Copy)]
pub struct MessageRouter {
    incoming: &'static LineChannel,
    outgoing: &'static LineChannel,
}

impl MessageRouter {
    /// Create a router over the given channels.
    pub fn new(incoming: &'static LineChannel, outgoing: &'static LineChannel) -> Self {
        Self { incoming, outgoing }
    }

    /// Create a router over a freshly leaked channel pair.
    ///
    /// For host tests and bring-up, where a `static` per test would leak
    /// state between cases instead.
    pub fn leaked() -> Self {
        Self {
            incoming: Box::leak(Box::new(Channel::new())),
            outgoing: Box::leak(Box::new(Channel::new())),
        }
    }

    /// Push one completed inbound line (RX task side). Non-blocking.
    pub fn push_incoming(&self, line: String) -> Result<(), TransportError> {
        self.incoming
            .sender()
            .try_send(line)
            .map_err(|TrySendError::Full(_)| TransportError::QueueFull)
    }

    /// Drain all available inbound lines (dispatch side). Non-blocking.
    pub fn receive_all(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let receiver = self.incoming.receiver();
        loop {
            match receiver.try_receive() {
                Ok(line) => lines.push(line),
                Err(TryReceiveError::Empty) => break,
            }
        }
        lines
    }

    /// Enqueue one outbound line (producer side). Non-blocking.
    pub fn send(&self, line: String) -> Result<(), TransportError> {
        self.outgoing
            .sender()
            .try_send(line)
            .map_err(|TrySendError::Full(_)| TransportError::QueueFull)
    }

    /// Take the next outbound line (TX task side). Non-blocking.
    pub fn try_receive_outgoing(&self) -> Option<String> {
        self.outgoing.receiver().try_receive().ok()
    }
}

/// The [`MessageSink`] face of a router's outbound queue.
///
/// Oversized lines are truncated to the frame limit (explicitly lossy),
/// never rejected. A full queue drops the line with a rate-limited warning
/// and surfaces [`TransportError::QueueFull`] to the producer.
pub struct LineSender {
    router: MessageRouter,
    drops: Cell<u32>,
    truncations: Cell<u32>,
}

impl LineSender {
    pub fn new(router: MessageRouter) -> Self {
        Self {
            router,
            drops: Cell::new(0),
            truncations: Cell::new(0),
        }
    }

    /// Lines dropped by a full outbound queue.
    pub fn drops(&self) -> u32 {
        self.drops.get()
    }

    /// Lines truncated to the frame limit.
    pub fn truncations(&self) -> u32 {
        self.truncations.get()
    }

    fn truncate_to_frame(&self, line: String) -> String {
        // Leave one byte for the terminator the TX task appends.
        let limit = MAX_MESSAGE_LENGTH - 1;
        if line.len() <= limit {
            return line;
        }
        self.truncations.set(self.truncations.get().wrapping_add(1));
        let mut end = limit;
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        warn!("outbound line truncated from {} to {} bytes", line.len(), end);
        let mut line = line;
        line.truncate(end);
        line
    }
}

impl MessageSink for LineSender {
    fn try_send_line(&self, line: String) -> Result<(), TransportError> {
        let line = self.truncate_to_frame(line);
        match self.router.send(line) {
            Ok(()) => Ok(()),
            Err(e) => {
                let drops = self.drops.get().wrapping_add(1);
                self.drops.set(drops);
                if drops % DROP_WARN_EVERY == 1 {
                    warn!("outbound queue full, {} lines dropped so far", drops);
                }
                Err(e)
            }
        }
    }
}
