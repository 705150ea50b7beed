//! The wire envelope.
//!
//! Each message on a link is a single JSON object on one `\n`-terminated
//! line, at most [`MAX_MESSAGE_LENGTH`] bytes. Key names are single
//! characters to keep envelopes short on slow UARTs.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::value::DataType;

/// Longest line a link will carry, in bytes (terminator included).
///
/// The receive side discards partial lines that exceed this before a
/// terminator arrives; the transmit side truncates longer lines.
pub const MAX_MESSAGE_LENGTH: usize = 1000;

/// One named-value snapshot as it travels over a link.
///
/// `data` holds one hex string per element (two hex characters per byte,
/// little-endian byte order), `total_bytes` must equal
/// `count * data_type.byte_size()`, and `checksum` is the CRC-32 of the
/// concatenated raw payload bytes. All keys are required; a missing key
/// fails deserialization of the whole line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEnvelope {
    /// Value name, unique per link.
    #[serde(rename = "N")]
    pub name: String,
    /// Element count (the value's arity).
    #[serde(rename = "C")]
    pub count: usize,
    /// Element type tag.
    #[serde(rename = "T")]
    pub data_type: DataType,
    /// Total payload size in bytes.
    #[serde(rename = "B")]
    pub total_bytes: usize,
    /// Hex-encoded payload, one string per element.
    #[serde(rename = "D")]
    pub data: Vec<String>,
    /// Sender's change count for this value.
    #[serde(rename = "I")]
    pub change_count: u32,
    /// CRC-32 of the raw payload bytes.
    #[serde(rename = "S")]
    pub checksum: u32,
}
