//! Canonical string codec for value arrays.
//!
//! A whole value (all N elements) has one canonical string: the elements'
//! canonical forms joined by [`VALUE_DIVIDER`]. This is the form stored in
//! NVM preferences and checked against validation allow-lists.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use st_model::DataValue;

/// Separator between element canonical forms.
pub const VALUE_DIVIDER: char = '|';

/// Join the canonical forms of `values` into one string.
pub fn join_canonical<T: DataValue>(values: &[T]) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(VALUE_DIVIDER);
        }
        out.push_str(&value.to_canonical());
    }
    out
}

/// Decode a canonical string into exactly `expected` elements.
///
/// The split must yield exactly `expected` substrings and every substring
/// must decode; otherwise the whole array is rejected and `None` is
/// returned (no partial results).
pub fn decode_canonical<T: DataValue>(s: &str, expected: usize) -> Option<Vec<T>> {
    let mut values = Vec::with_capacity(expected);
    for part in s.split(VALUE_DIVIDER) {
        if values.len() == expected {
            // More substrings than elements.
            return None;
        }
        values.push(T::from_canonical(part)?);
    }
    if values.len() == expected { Some(values) } else { None }
}
