//! Typed elements and their wire/canonical encodings.
//!
//! Every named value is an array of fixed arity whose elements all share one
//! [`DataType`]. An element has two encodings:
//!
//! - a fixed-size little-endian byte form used inside the wire envelope, and
//! - a canonical string form used for validation allow-lists and NVM
//!   persistence.
//!
//! [`DataValue`] ties a Rust type to its tag and both encodings, so encode,
//! decode and compare all dispatch through the type system.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// Fixed wire size of a [`TextValue`] element, including NUL padding.
pub const TEXT_VALUE_BYTES: usize = 32;

/// Wire type tag of a named value.
///
/// The tag travels in the envelope's `T` key as a snake_case string and
/// selects the per-element byte size. The set is closed: both ends of a link
/// are built from the same model crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Uint8,
    Uint16,
    Uint32,
    Char,
    Text,
    Float32,
    Float64,
    BtDeviceInfo,
    SoundFrame,
    MaxBandFrame,
}

impl DataType {
    /// Wire size of one element of this type, in bytes.
    pub const fn byte_size(self) -> usize {
        match self {
            DataType::Bool | DataType::Int8 | DataType::Uint8 | DataType::Char => 1,
            DataType::Int16 | DataType::Uint16 => 2,
            DataType::Int32 | DataType::Uint32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
            DataType::Text => TEXT_VALUE_BYTES,
            // 32-byte name + 6-byte address + 1-byte RSSI
            DataType::BtDeviceInfo => TEXT_VALUE_BYTES + 6 + 1,
            // f32 power + i32 minimum + i32 maximum
            DataType::SoundFrame => 12,
            // f32 power + u16 band index + u16 band total
            DataType::MaxBandFrame => 8,
        }
    }
}

/// An element type that can travel over the serial link.
///
/// `to_bytes` must append exactly [`DataType::byte_size`] bytes for
/// `Self::DATA_TYPE`, and `from_bytes` receives exactly that many. The
/// canonical string round-trips through `from_canonical` for every value
/// producible by `to_canonical`.
pub trait DataValue: Clone + PartialEq + core::fmt::Debug {
    /// Wire type tag of this element type.
    const DATA_TYPE: DataType;

    /// Append the little-endian wire bytes of this element.
    fn to_bytes(&self, out: &mut Vec<u8>);

    /// Decode one element from its wire bytes.
    ///
    /// Returns `None` when `bytes` has the wrong length or holds an invalid
    /// bit pattern for this type.
    fn from_bytes(bytes: &[u8]) -> Option<Self>;

    /// Canonical string form (validation and persistence).
    fn to_canonical(&self) -> String;

    /// Parse the canonical string form.
    fn from_canonical(s: &str) -> Option<Self>;
}

macro_rules! impl_numeric_value {
    ($ty:ty, $tag:expr) => {
        impl DataValue for $ty {
            const DATA_TYPE: DataType = $tag;

            fn to_bytes(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn from_bytes(bytes: &[u8]) -> Option<Self> {
                Some(<$ty>::from_le_bytes(bytes.try_into().ok()?))
            }

            fn to_canonical(&self) -> String {
                format!("{}", self)
            }

            fn from_canonical(s: &str) -> Option<Self> {
                s.trim().parse().ok()
            }
        }
    };
}

impl_numeric_value!(i8, DataType::Int8);
impl_numeric_value!(i16, DataType::Int16);
impl_numeric_value!(i32, DataType::Int32);
impl_numeric_value!(u8, DataType::Uint8);
impl_numeric_value!(u16, DataType::Uint16);
impl_numeric_value!(u32, DataType::Uint32);
impl_numeric_value!(f32, DataType::Float32);
impl_numeric_value!(f64, DataType::Float64);

impl DataValue for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    fn to_bytes(&self, out: &mut Vec<u8>) {
        out.push(if *self { 1 } else { 0 });
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0] => Some(false),
            [_] => Some(true),
            _ => None,
        }
    }

    fn to_canonical(&self) -> String {
        String::from(if *self { "1" } else { "0" })
    }

    fn from_canonical(s: &str) -> Option<Self> {
        match s.trim() {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        }
    }
}

impl DataValue for char {
    const DATA_TYPE: DataType = DataType::Char;

    fn to_bytes(&self, out: &mut Vec<u8>) {
        // Single-byte wire form; non-ASCII characters degrade to '?'.
        out.push(if self.is_ascii() { *self as u8 } else { b'?' });
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [b] if b.is_ascii() => Some(*b as char),
            _ => None,
        }
    }

    fn to_canonical(&self) -> String {
        let mut s = String::new();
        s.push(*self);
        s
    }

    fn from_canonical(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let c = chars.next()?;
        if chars.next().is_some() { None } else { Some(c) }
    }
}

/// Fixed-capacity text element.
///
/// Holds at most [`TEXT_VALUE_BYTES`] UTF-8 bytes and always occupies exactly
/// that many bytes on the wire (NUL-padded), keeping the envelope's
/// `total_bytes = count * byte_size` invariant for text-typed values.
/// Construction truncates at a character boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextValue(String);

impl TextValue {
    pub fn new(s: &str) -> Self {
        let mut end = s.len().min(TEXT_VALUE_BYTES);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        Self(String::from(&s[..end]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for TextValue {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl DataValue for TextValue {
    const DATA_TYPE: DataType = DataType::Text;

    fn to_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.0.as_bytes());
        for _ in self.0.len()..TEXT_VALUE_BYTES {
            out.push(0);
        }
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != TEXT_VALUE_BYTES {
            return None;
        }
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let s = core::str::from_utf8(&bytes[..end]).ok()?;
        Some(Self(String::from(s)))
    }

    fn to_canonical(&self) -> String {
        self.0.clone()
    }

    fn from_canonical(s: &str) -> Option<Self> {
        Some(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;
    use alloc::vec::Vec;

    fn byte_round_trip<T: DataValue>(value: T) {
        let mut bytes = Vec::new();
        value.to_bytes(&mut bytes);
        assert_eq!(bytes.len(), T::DATA_TYPE.byte_size());
        assert_eq!(T::from_bytes(&bytes), Some(value));
    }

    fn canonical_round_trip<T: DataValue>(value: T) {
        let s = value.to_canonical();
        assert_eq!(T::from_canonical(&s), Some(value));
    }

    #[test]
    fn test_numeric_round_trips() {
        byte_round_trip(-120i8);
        byte_round_trip(-30_000i16);
        byte_round_trip(-2_000_000_000i32);
        byte_round_trip(250u8);
        byte_round_trip(60_000u16);
        byte_round_trip(4_000_000_000u32);
        byte_round_trip(3.5f32);
        byte_round_trip(-0.25f64);

        canonical_round_trip(-120i8);
        canonical_round_trip(4_000_000_000u32);
        canonical_round_trip(3.5f32);
        canonical_round_trip(-0.25f64);
    }

    #[test]
    fn test_bool_and_char() {
        byte_round_trip(true);
        byte_round_trip(false);
        byte_round_trip('A');

        assert_eq!(bool::from_canonical("1"), Some(true));
        assert_eq!(bool::from_canonical("0"), Some(false));
        assert_eq!(bool::from_canonical("yes"), None);

        assert_eq!(char::from_canonical("x"), Some('x'));
        assert_eq!(char::from_canonical("xy"), None);
    }

    #[test]
    fn test_text_fixed_width() {
        let text = TextValue::new("Tower");
        let mut bytes = Vec::new();
        text.to_bytes(&mut bytes);
        assert_eq!(bytes.len(), TEXT_VALUE_BYTES);
        assert_eq!(TextValue::from_bytes(&bytes), Some(text));
    }

    #[test]
    fn test_text_truncates_at_capacity() {
        let long = "x".repeat(TEXT_VALUE_BYTES + 10);
        let text = TextValue::new(&long);
        assert_eq!(text.as_str().len(), TEXT_VALUE_BYTES);
        byte_round_trip(text);
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        assert_eq!(i32::from_bytes(&[1, 2]), None);
        assert_eq!(TextValue::from_bytes(&[0u8; 4]), None);
    }
}
