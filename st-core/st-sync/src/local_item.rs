//! In-process typed value store.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use log::warn;
use st_model::{DataValue, UpdateStatus};

use crate::callbacks::{ChangeCallback, NamedCallbackRegistry};
use crate::codec;
use crate::validator::ValidValueChecker;

/// A named, change-tracked value of `N` elements of `T`, without transport.
///
/// The buffer always holds exactly `N` elements; the change count moves by
/// exactly 1 per accepted distinct value and never otherwise. Rejected
/// updates leave the previous value untouched. Callbacks run synchronously
/// on the writer's task, after the buffer copy completes.
pub struct LocalDataItem<T: DataValue, const N: usize> {
    name: String,
    value: [T; N],
    initial: [T; N],
    change_count: u32,
    validator: Option<ValidValueChecker>,
    callbacks: NamedCallbackRegistry<T, N>,
}

impl<T: DataValue, const N: usize> LocalDataItem<T, N> {
    /// Create the store with its boot value.
    ///
    /// Zero arity is a static configuration bug, not a runtime condition.
    /// The initial value bypasses validation: it is part of the same static
    /// configuration, and the buffer must never be uninitialized.
    pub fn new(name: &str, initial: [T; N]) -> Self {
        assert!(N > 0, "data item {} declared with zero arity", name);
        Self {
            name: String::from(name),
            value: initial.clone(),
            initial,
            change_count: 0,
            validator: None,
            callbacks: NamedCallbackRegistry::new(),
        }
    }

    /// Attach an allow-list validator.
    pub fn with_validator(mut self, validator: ValidValueChecker) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Attach a named change callback.
    pub fn with_callback(mut self, name: &str, callback: ChangeCallback<T, N>) -> Self {
        self.callbacks.register(name, callback);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn change_count(&self) -> u32 {
        self.change_count
    }

    /// Borrow the stored elements.
    pub fn value(&self) -> &[T; N] {
        &self.value
    }

    /// Copy the stored elements out.
    pub fn get_value(&self) -> [T; N] {
        self.value.clone()
    }

    /// Canonical string of the whole value (elements joined by the divider).
    pub fn get_value_as_string(&self) -> String {
        codec::join_canonical(&self.value)
    }

    pub fn register_callback(&mut self, name: &str, callback: ChangeCallback<T, N>) {
        self.callbacks.register(name, callback);
    }

    pub fn deregister_callback(&mut self, name: &str) {
        self.callbacks.deregister(name);
    }

    /// Whether `candidate` would pass the configured validator.
    ///
    /// Vacuously true without a validator.
    pub fn is_valid(&self, candidate: &[T]) -> bool {
        match &self.validator {
            Some(v) => v.validate_all(candidate),
            None => true,
        }
    }

    /// Attempt to store a new value.
    ///
    /// The write applies only when the value differs elementwise from the
    /// stored one and passes validation; then the buffer is copied, the
    /// change count increments by exactly 1, and every callback runs with
    /// the new buffer.
    pub fn set_value(&mut self, new_value: &[T; N]) -> UpdateStatus {
        let mut status = UpdateStatus::default();
        status.value_changed = self.value != *new_value;
        status.valid_value = self.is_valid(new_value);
        status.update_allowed = status.value_changed && status.valid_value;
        if !status.update_allowed {
            return status;
        }

        self.value.clone_from(new_value);
        self.change_count = self.change_count.wrapping_add(1);
        self.callbacks.dispatch(&self.value);
        status.update_successful = true;
        status
    }

    /// Attempt to store a value from its canonical string form.
    ///
    /// The string must split into exactly `N` decodable substrings; any
    /// mismatch or undecodable element rejects the whole array atomically.
    pub fn set_value_from_string(&mut self, s: &str) -> UpdateStatus {
        let values: Vec<T> = match codec::decode_canonical(s, N) {
            Some(values) => values,
            None => {
                warn!("{}: rejected canonical string {:?}", self.name, s);
                return UpdateStatus::rejected();
            }
        };
        let array: [T; N] = match values.try_into() {
            Ok(array) => array,
            Err(_) => return UpdateStatus::rejected(),
        };
        self.set_value(&array)
    }

    /// Restore the boot value (factory reset of this item).
    pub fn restore_initial(&mut self) -> UpdateStatus {
        let initial = self.initial.clone();
        self.set_value(&initial)
    }
}
