//! Wire codec: typed buffers to and from checksummed JSON lines.
//!
//! Encoding builds a [`WireEnvelope`] with two hex characters per payload
//! byte and a CRC-32 of the raw payload. Decoding re-derives everything the
//! envelope declares and hard-rejects on any disagreement: bad JSON or a
//! missing key, a checksum mismatch, a byte-count mismatch, or an element
//! count that does not match. A rejected line produces nothing.
//!
//! The functions here are stateless and safely shared; callers own the
//! failure accounting ([`DecodeStats`]).

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;

use log::warn;
use st_model::{DataValue, WireEnvelope};

use crate::error::SerializerError;

/// Decode failures per summary log line.
const LOG_EVERY_FAILURES: u32 = 25;

fn payload_crc(payload: &[u8]) -> u32 {
    crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC).checksum(payload)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        // Writing to a String cannot fail.
        let _ = write!(out, "{:02X}", byte);
    }
    out
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(s.len() / 2);
    for i in (0..s.len()).step_by(2) {
        let pair = s.get(i..i + 2)?;
        out.push(u8::from_str_radix(pair, 16).ok()?);
    }
    Some(out)
}

/// Encode a typed buffer as one wire line (without the `\n` terminator).
pub fn serialize_envelope<T: DataValue>(
    name: &str,
    values: &[T],
    change_count: u32,
) -> Result<String, SerializerError> {
    let elem_size = T::DATA_TYPE.byte_size();
    let mut payload = Vec::with_capacity(values.len() * elem_size);
    let mut data = Vec::with_capacity(values.len());
    for value in values {
        let start = payload.len();
        value.to_bytes(&mut payload);
        debug_assert_eq!(payload.len() - start, elem_size);
        data.push(hex_encode(&payload[start..]));
    }

    let envelope = WireEnvelope {
        name: String::from(name),
        count: values.len(),
        data_type: T::DATA_TYPE,
        total_bytes: payload.len(),
        data,
        change_count,
        checksum: payload_crc(&payload),
    };

    serde_json::to_string(&envelope)
        .map_err(|e| SerializerError::Malformed(format!("encode: {}", e)))
}

/// Decode and verify one wire line into an envelope.
///
/// The returned envelope has passed every structural check; its payload is
/// still hex (use [`decode_values`] to recover typed elements).
pub fn deserialize_envelope(line: &str) -> Result<WireEnvelope, SerializerError> {
    let envelope: WireEnvelope = serde_json::from_str(line.trim_end())
        .map_err(|e| SerializerError::Malformed(format!("decode: {}", e)))?;

    if envelope.data.len() != envelope.count {
        return Err(SerializerError::CountMismatch {
            declared: envelope.count,
            actual: envelope.data.len(),
        });
    }

    let elem_size = envelope.data_type.byte_size();
    let expected_bytes = envelope.count * elem_size;
    if envelope.total_bytes != expected_bytes {
        return Err(SerializerError::SizeMismatch {
            declared: envelope.total_bytes,
            expected: expected_bytes,
        });
    }

    let mut payload = Vec::with_capacity(expected_bytes);
    for elem in &envelope.data {
        let bytes = hex_decode(elem)
            .ok_or_else(|| SerializerError::Malformed(format!("bad hex element {:?}", elem)))?;
        if bytes.len() != elem_size {
            return Err(SerializerError::SizeMismatch {
                declared: envelope.total_bytes,
                expected: expected_bytes,
            });
        }
        payload.extend_from_slice(&bytes);
    }

    let computed = payload_crc(&payload);
    if computed != envelope.checksum {
        return Err(SerializerError::ChecksumMismatch {
            declared: envelope.checksum,
            computed,
        });
    }

    Ok(envelope)
}

/// Recover the typed elements of a verified envelope.
pub fn decode_values<T: DataValue>(envelope: &WireEnvelope) -> Result<Vec<T>, SerializerError> {
    if envelope.data_type != T::DATA_TYPE {
        return Err(SerializerError::TypeMismatch);
    }
    let mut values = Vec::with_capacity(envelope.data.len());
    for elem in &envelope.data {
        let bytes = hex_decode(elem)
            .ok_or_else(|| SerializerError::Malformed(format!("bad hex element {:?}", elem)))?;
        let value = T::from_bytes(&bytes)
            .ok_or_else(|| SerializerError::Malformed(format!("undecodable element {:?}", elem)))?;
        values.push(value);
    }
    Ok(values)
}

/// Rolling decode-failure accounting.
///
/// Failures log a summary every [`LOG_EVERY_FAILURES`] occurrences rather
/// than once per message, so a noisy link cannot flood the log.
#[derive(Debug, Default)]
pub struct DecodeStats {
    ok: u32,
    failed: u32,
}

impl DecodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ok(&mut self) {
        self.ok = self.ok.wrapping_add(1);
    }

    pub fn record_failure(&mut self, error: &SerializerError) {
        self.failed = self.failed.wrapping_add(1);
        if self.failed % LOG_EVERY_FAILURES == 0 {
            warn!(
                "envelope decode failures: {} rejected, {} accepted (latest: {})",
                self.failed, self.ok, error
            );
        }
    }

    pub fn ok_count(&self) -> u32 {
        self.ok
    }

    pub fn failure_count(&self) -> u32 {
        self.failed
    }
}
