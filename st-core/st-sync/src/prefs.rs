//! Debounced preference persistence.
//!
//! Flash tolerates a bounded number of writes, and users twist knobs in
//! bursts. Saves inside the quiet window arm a single one-shot deadline
//! and coalesce; the physical write happens when the window (plus a small
//! buffer) elapses, or immediately when the last write is old enough.

extern crate alloc;

use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;

use log::{debug, warn};
use st_model::{DataValue, WireEnvelope};
use st_shared::{PreferenceStore, RxHandler};

use crate::item::DataItem;

/// Quiet window between physical writes of one preference.
pub const TIMER_TIME_MS: u64 = 10_000;

/// Slack added when arming the one-shot deadline.
pub const TIMER_BUFFER_MS: u64 = 10;

struct PendingWrite {
    value: String,
    deadline_ms: u64,
}

/// Debounced load/save of one value's canonical string to NVM.
///
/// At most one write is pending per key; a newer save inside the window
/// replaces the pending value (last writer wins).
pub struct PreferencesPersistence {
    key: String,
    store: Rc<RefCell<dyn PreferenceStore>>,
    last_write_ms: Option<u64>,
    pending: Option<PendingWrite>,
}

impl PreferencesPersistence {
    pub fn new(key: &str, store: Rc<RefCell<dyn PreferenceStore>>) -> Self {
        Self {
            key: String::from(key),
            store,
            last_write_ms: None,
            pending: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored value, seeding the key with `default_value` when
    /// missing, then offer it to `accept` before it enters the live store.
    ///
    /// A stored value `accept` rejects is replaced by the default (which is
    /// offered in turn). Returns the string that ended up accepted.
    pub fn initialize_nvm(
        &mut self,
        default_value: &str,
        mut accept: impl FnMut(&str) -> bool,
    ) -> String {
        let loaded = {
            let mut store = self.store.borrow_mut();
            if store.is_key(&self.key) {
                store.get_string(&self.key, default_value)
            } else {
                if let Err(e) = store.put_string(&self.key, default_value) {
                    warn!("{}: seeding default failed: {}", self.key, e);
                }
                String::from(default_value)
            }
        };

        if accept(&loaded) {
            return loaded;
        }

        warn!(
            "{}: stored value {:?} rejected on load, falling back to default",
            self.key, loaded
        );
        if let Err(e) = self.store.borrow_mut().put_string(&self.key, default_value) {
            warn!("{}: reseeding default failed: {}", self.key, e);
        }
        let _ = accept(default_value);
        String::from(default_value)
    }

    /// Request a save of `value`.
    ///
    /// Inside the quiet window the write is deferred to one one-shot
    /// deadline (remaining window plus [`TIMER_BUFFER_MS`]) and coalesced
    /// with later requests; otherwise it happens immediately and restarts
    /// the window clock.
    pub fn save(&mut self, now_ms: u64, value: &str) {
        if let Some(last) = self.last_write_ms {
            let elapsed = now_ms.saturating_sub(last);
            if elapsed < TIMER_TIME_MS {
                let deadline_ms = last + TIMER_TIME_MS + TIMER_BUFFER_MS;
                self.pending = Some(PendingWrite {
                    value: String::from(value),
                    deadline_ms,
                });
                return;
            }
        }
        self.write_now(now_ms, value);
    }

    /// Fire a due pending write.
    pub fn tick(&mut self, now_ms: u64) {
        let due = matches!(&self.pending, Some(p) if now_ms >= p.deadline_ms);
        if due {
            if let Some(pending) = self.pending.take() {
                self.write_now(now_ms, &pending.value);
            }
        }
    }

    /// Whether a write is armed but not yet fired.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn write_now(&mut self, now_ms: u64, value: &str) {
        self.pending = None;
        match self.store.borrow_mut().put_string(&self.key, value) {
            Ok(()) => {
                self.last_write_ms = Some(now_ms);
                debug!("{}: wrote {:?}", self.key, value);
            }
            Err(e) => warn!("{}: write failed: {}", self.key, e),
        }
    }
}

/// A [`DataItem`] whose value survives reboots.
///
/// Loads at construction through [`PreferencesPersistence::initialize_nvm`]
/// (the item's own validated string setter is the load filter) and requests
/// a save after every accepted change, local or committed remote.
pub struct DataItemWithPreferences<T: DataValue, const N: usize> {
    item: DataItem<T, N>,
    prefs: PreferencesPersistence,
    last_persisted_count: u32,
}

impl<T: DataValue, const N: usize> DataItemWithPreferences<T, N> {
    /// Wrap `item`, loading any stored value into it.
    ///
    /// The item's current canonical string is the seed default for a
    /// missing key.
    pub fn new(mut item: DataItem<T, N>, store: Rc<RefCell<dyn PreferenceStore>>) -> Self {
        let mut prefs = PreferencesPersistence::new(item.name(), store);
        let default_value = item.get_value_as_string();
        prefs.initialize_nvm(&default_value, |s| {
            let status = item.set_value_from_string(s);
            // Accepted: applied, or equal to what the item already holds.
            status.update_successful || (status.valid_value && !status.value_changed)
        });
        let last_persisted_count = item.change_count();
        Self {
            item,
            prefs,
            last_persisted_count,
        }
    }

    pub fn item(&self) -> &DataItem<T, N> {
        &self.item
    }

    pub fn name(&self) -> &str {
        self.item.name()
    }

    pub fn change_count(&self) -> u32 {
        self.item.change_count()
    }

    pub fn get_value(&self) -> [T; N] {
        self.item.get_value()
    }

    pub fn get_value_as_string(&self) -> String {
        self.item.get_value_as_string()
    }

    pub fn set_value(&mut self, new_value: &[T; N], now_ms: u64) -> st_model::UpdateStatus {
        let status = self.item.set_new_tx_value(new_value);
        self.persist_if_changed(now_ms);
        status
    }

    pub fn set_value_from_string(&mut self, s: &str, now_ms: u64) -> st_model::UpdateStatus {
        let status = self.item.set_value_from_string(s);
        self.persist_if_changed(now_ms);
        status
    }

    /// Drive the item's timer and the debounce deadline, and pick up
    /// changes committed from the receive path.
    pub fn tick(&mut self, now_ms: u64) {
        self.item.tick(now_ms);
        self.persist_if_changed(now_ms);
        self.prefs.tick(now_ms);
    }

    fn persist_if_changed(&mut self, now_ms: u64) {
        let count = self.item.change_count();
        if count != self.last_persisted_count {
            self.last_persisted_count = count;
            let value = self.item.get_value_as_string();
            self.prefs.save(now_ms, &value);
        }
    }
}

impl<T: DataValue, const N: usize> RxHandler for DataItemWithPreferences<T, N> {
    fn name(&self) -> &str {
        self.item.name()
    }

    fn on_envelope(&mut self, envelope: &WireEnvelope) {
        self.item.on_envelope(envelope);
        // The save itself is requested from the next tick, which knows the
        // clock; receipt alone must not block on NVM.
    }
}
