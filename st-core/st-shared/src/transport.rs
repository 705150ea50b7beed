//! Transport-facing traits.
//!
//! A synchronized value talks to its link through two narrow interfaces:
//! it pushes complete outbound lines into a [`MessageSink`], and the link's
//! dispatch side hands decoded envelopes to the one [`RxHandler`] whose
//! name matches. Both sides are non-blocking; a full queue is an error the
//! caller absorbs, never a stall.

extern crate alloc;

use alloc::string::String;
use core::fmt;

use st_model::WireEnvelope;

/// Error type for transport operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The bounded outbound queue is full; the line was dropped.
    QueueFull,
    /// The line could not be serialized or framed.
    Serialization(String),
    /// The underlying link is gone.
    ConnectionLost,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::QueueFull => write!(f, "outbound queue full"),
            TransportError::Serialization(msg) => write!(f, "serialization error: {}", msg),
            TransportError::ConnectionLost => write!(f, "connection lost"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {
    // Default implementation is sufficient
}

/// Non-blocking sink for complete outbound lines.
///
/// Implementations enqueue the line without its `\n` terminator; the I/O
/// side appends it on the wire. `try_send_line` never blocks: a full queue
/// returns [`TransportError::QueueFull`] and the line is gone.
pub trait MessageSink {
    fn try_send_line(&self, line: String) -> Result<(), TransportError>;
}

/// A named target for inbound envelopes.
///
/// The dispatch side routes each decoded envelope to the single registered
/// handler whose `name` matches the envelope's. Handlers absorb their own
/// failures (a bad payload rejects the update and logs; it never
/// propagates).
pub trait RxHandler {
    /// The value name this handler owns.
    fn name(&self) -> &str;

    /// Accept one decoded envelope addressed to this handler.
    fn on_envelope(&mut self, envelope: &WireEnvelope);
}
