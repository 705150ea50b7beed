//! Shared traits for the SoundTower synchronization layer.
//!
//! The engine, the serial plumbing and the firmware targets meet through
//! the traits in this crate: a millisecond clock, a key-value preference
//! store, a non-blocking message sink, and a named receive handler. The
//! in-memory implementations back host tests and early bring-up.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

pub mod nvm;
pub mod time;
pub mod transport;

pub use nvm::{MemoryPreferenceStore, NvmError, PreferenceStore};
pub use time::{ManualTime, TimeProvider};
pub use transport::{MessageSink, RxHandler, TransportError};
