//! Error types for st-sync

extern crate alloc;

use alloc::string::String;
use core::fmt;

/// Error type for wire codec operations.
///
/// Every variant is a hard reject: no envelope or value is produced, the
/// message is dropped, and the caller accounts for the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializerError {
    /// The line is not a well-formed envelope (bad JSON, missing key,
    /// or invalid hex payload).
    Malformed(String),
    /// Recomputed payload checksum disagrees with the declared one.
    ChecksumMismatch { declared: u32, computed: u32 },
    /// Declared element count disagrees with the payload.
    CountMismatch { declared: usize, actual: usize },
    /// Declared byte total disagrees with `count * byte_size`.
    SizeMismatch { declared: usize, expected: usize },
    /// Envelope carries a different type tag than the receiving value.
    TypeMismatch,
}

impl fmt::Display for SerializerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializerError::Malformed(msg) => write!(f, "malformed envelope: {}", msg),
            SerializerError::ChecksumMismatch { declared, computed } => {
                write!(f, "checksum mismatch: declared {} computed {}", declared, computed)
            }
            SerializerError::CountMismatch { declared, actual } => {
                write!(f, "element count mismatch: declared {} got {}", declared, actual)
            }
            SerializerError::SizeMismatch { declared, expected } => {
                write!(f, "byte count mismatch: declared {} expected {}", declared, expected)
            }
            SerializerError::TypeMismatch => write!(f, "type tag mismatch"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SerializerError {
    // Default implementation is sufficient
}
