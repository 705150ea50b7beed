//! The SoundTower synchronization engine.
//!
//! This crate implements the typed data synchronization layer shared by
//! every CPU in the tower: change-tracked local values with validation and
//! callbacks, the policy engine that decides when a value travels over its
//! serial link, the checksummed wire codec, and debounced persistence of
//! values to non-volatile memory.
//!
//! The crate is platform-free: links are reached through
//! [`st_shared::MessageSink`], clocks through [`st_shared::TimeProvider`],
//! and NVM through [`st_shared::PreferenceStore`].

#![no_std]

#[cfg(feature = "std")]
extern crate std;

pub mod callbacks;
pub mod codec;
pub mod error;
pub mod item;
pub mod local_item;
pub mod prefs;
pub mod serializer;
pub mod validator;

pub use callbacks::NamedCallbackRegistry;
pub use error::SerializerError;
pub use item::DataItem;
pub use local_item::LocalDataItem;
pub use prefs::{DataItemWithPreferences, PreferencesPersistence, TIMER_BUFFER_MS, TIMER_TIME_MS};
pub use serializer::DecodeStats;
pub use validator::ValidValueChecker;
