//! Synchronous change-notification dispatch.

extern crate alloc;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

/// Listener invoked with the new buffer after an accepted change.
pub type ChangeCallback<T, const N: usize> = Box<dyn FnMut(&[T; N])>;

/// Named registry of change listeners for one value.
///
/// Dispatch is synchronous and in registration order, on the caller's
/// task; there is no deferred delivery. Registering an existing name
/// replaces its callback.
pub struct NamedCallbackRegistry<T, const N: usize> {
    entries: Vec<(String, ChangeCallback<T, N>)>,
}

impl<T, const N: usize> NamedCallbackRegistry<T, N> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn register(&mut self, name: &str, callback: ChangeCallback<T, N>) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = callback;
        } else {
            self.entries.push((String::from(name), callback));
        }
    }

    pub fn deregister(&mut self, name: &str) {
        self.entries.retain(|(n, _)| n != name);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invoke every listener with the new buffer.
    pub fn dispatch(&mut self, value: &[T; N]) {
        for (_, callback) in self.entries.iter_mut() {
            callback(value);
        }
    }
}

impl<T, const N: usize> Default for NamedCallbackRegistry<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;
    use alloc::rc::Rc;
    use core::cell::Cell;

    #[test]
    fn test_dispatch_order_and_replace() {
        let seen = Rc::new(Cell::new(0u32));
        let mut registry: NamedCallbackRegistry<i32, 1> = NamedCallbackRegistry::new();

        let s = seen.clone();
        registry.register("ui", Box::new(move |v| s.set(s.get() + v[0] as u32)));
        registry.dispatch(&[5]);
        assert_eq!(seen.get(), 5);

        // Re-registering the same name replaces, not duplicates.
        let s = seen.clone();
        registry.register("ui", Box::new(move |v| s.set(s.get() + 10 * v[0] as u32)));
        registry.dispatch(&[1]);
        assert_eq!(seen.get(), 15);

        registry.deregister("ui");
        registry.dispatch(&[100]);
        assert_eq!(seen.get(), 15);
    }
}
