//! Firmware core library.
//!
//! This crate provides the serial transport plumbing shared between
//! firmware implementations and host tests: newline framing with a hard
//! length bound, bounded message queues between I/O tasks and the engine
//! loop, and the dispatch manager that routes decoded envelopes to their
//! registered values.

#![no_std]

pub mod fake;
pub mod framing;
pub mod manager;
pub mod message_router;

pub use fake::FakeLink;
pub use framing::LineFramer;
pub use manager::SerialMessageManager;
pub use message_router::{LineChannel, LineSender, MessageRouter, QUEUE_DEPTH};
