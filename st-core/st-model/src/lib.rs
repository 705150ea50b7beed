//! Data model for the SoundTower synchronization protocol.
//!
//! This crate defines the vocabulary shared by every CPU in the tower: the
//! wire type tags and their fixed byte sizes, the per-element value codec,
//! the domain record types carried between the audio and LED controllers,
//! the JSON wire envelope, and the transmission policies. It contains no
//! I/O and no engine logic.

#![no_std]

pub mod envelope;
pub mod policy;
pub mod records;
pub mod value;

pub use envelope::{MAX_MESSAGE_LENGTH, WireEnvelope};
pub use policy::{CommitMode, RxTxPolicy, UpdateStatus};
pub use records::{BtDeviceInfo, MaxBandFrame, ProcessedSoundFrame};
pub use value::{DataType, DataValue, TEXT_VALUE_BYTES, TextValue};
