//! Key-value preference store abstraction.
//!
//! Non-volatile preferences live behind a minimal string-keyed interface:
//! the device backs it with a CRC-validated flash block, tests with a map.

extern crate alloc;

use alloc::string::String;
use core::fmt;

use hashbrown::HashMap;

/// Error writing to the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NvmError {
    /// The physical write failed.
    WriteFailed,
    /// The store cannot hold another key or a value this large.
    CapacityExceeded,
}

impl fmt::Display for NvmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NvmError::WriteFailed => write!(f, "NVM write failed"),
            NvmError::CapacityExceeded => write!(f, "NVM capacity exceeded"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NvmError {
    // Default implementation is sufficient
}

/// A string-keyed non-volatile store.
pub trait PreferenceStore {
    /// Whether `key` exists in the store.
    fn is_key(&self, key: &str) -> bool;

    /// Read `key`, or `default` when the key is missing.
    fn get_string(&self, key: &str, default: &str) -> String;

    /// Write `key` to the store.
    fn put_string(&mut self, key: &str, value: &str) -> Result<(), NvmError>;
}

/// In-memory store for tests and bring-up.
///
/// Counts physical writes so debounce behavior can be asserted on.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    entries: HashMap<String, String>,
    put_count: usize,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put_string` calls that reached the store.
    pub fn put_count(&self) -> usize {
        self.put_count
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn is_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| String::from(default))
    }

    fn put_string(&mut self, key: &str, value: &str) -> Result<(), NvmError> {
        self.put_count += 1;
        self.entries.insert(String::from(key), String::from(value));
        Ok(())
    }
}
