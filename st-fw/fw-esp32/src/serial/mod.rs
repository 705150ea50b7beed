//! Inter-CPU serial link: static channels and the UART I/O task.

pub mod io_task;

pub use io_task::{rx_task, tx_task};

use fw_core::{LineChannel, MessageRouter};

/// Message channels (static for the router)
static INCOMING_MSG: LineChannel = LineChannel::new();
static OUTGOING_MSG: LineChannel = LineChannel::new();

/// Router over this link's channels.
pub fn message_router() -> MessageRouter {
    MessageRouter::new(&INCOMING_MSG, &OUTGOING_MSG)
}
