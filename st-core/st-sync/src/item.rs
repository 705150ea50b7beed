//! Policy-driven synchronized value.
//!
//! A [`DataItem`] is a [`LocalDataItem`] plus a link: it stages outbound
//! values, runs the periodic transmit timer, accepts inbound envelopes into
//! an RX shadow buffer, and applies the commit policy that decides when the
//! authoritative store changes. One item owns all of its buffers; the link
//! is referenced through a shared [`MessageSink`].

extern crate alloc;

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, warn};
use st_model::{CommitMode, DataValue, RxTxPolicy, UpdateStatus, WireEnvelope};
use st_shared::{MessageSink, RxHandler};

use crate::callbacks::ChangeCallback;
use crate::codec;
use crate::local_item::LocalDataItem;
use crate::serializer;
use crate::validator::ValidValueChecker;

/// A named value synchronized over a serial link.
pub struct DataItem<T: DataValue, const N: usize> {
    local: LocalDataItem<T, N>,
    policy: RxTxPolicy,
    rate_ms: u64,
    commit: CommitMode,
    sink: Rc<dyn MessageSink>,
    /// Staged outbound value; committed per [`CommitMode`].
    tx_value: [T; N],
    /// Counts staged outbound values; travels in the envelope.
    tx_change_count: u32,
    /// Shadow of the last applied inbound value.
    rx_value: [T; N],
    last_rx_change_count: Option<u32>,
    next_tx_deadline_ms: Option<u64>,
}

impl<T: DataValue, const N: usize> DataItem<T, N> {
    /// Create a synchronized value.
    ///
    /// `rate_ms` is the periodic transmit period; it is ignored under
    /// policies whose timer is off. The timer arms on the first
    /// [`tick`](Self::tick). Commit mode defaults to
    /// [`CommitMode::OnTransmit`].
    pub fn new(
        name: &str,
        initial: [T; N],
        policy: RxTxPolicy,
        rate_ms: u64,
        sink: Rc<dyn MessageSink>,
    ) -> Self {
        let tx_value = initial.clone();
        let rx_value = initial.clone();
        Self {
            local: LocalDataItem::new(name, initial),
            policy,
            rate_ms,
            commit: CommitMode::OnTransmit,
            sink,
            tx_value,
            tx_change_count: 0,
            rx_value,
            last_rx_change_count: None,
            next_tx_deadline_ms: None,
        }
    }

    /// Attach an allow-list validator.
    pub fn with_validator(mut self, validator: ValidValueChecker) -> Self {
        self.local = self.local.with_validator(validator);
        self
    }

    /// Attach a named change callback.
    pub fn with_callback(mut self, name: &str, callback: ChangeCallback<T, N>) -> Self {
        self.local = self.local.with_callback(name, callback);
        self
    }

    /// Select when outbound values become authoritative.
    pub fn with_commit_mode(mut self, commit: CommitMode) -> Self {
        self.commit = commit;
        self
    }

    pub fn name(&self) -> &str {
        self.local.name()
    }

    pub fn policy(&self) -> RxTxPolicy {
        self.policy
    }

    pub fn change_count(&self) -> u32 {
        self.local.change_count()
    }

    pub fn value(&self) -> &[T; N] {
        self.local.value()
    }

    pub fn get_value(&self) -> [T; N] {
        self.local.get_value()
    }

    pub fn get_value_as_string(&self) -> String {
        self.local.get_value_as_string()
    }

    /// Stage a new outbound value.
    ///
    /// The candidate must differ from the staged value and pass the
    /// validator; rejection leaves every buffer untouched. Under an
    /// on-change policy the staged value transmits immediately; under a
    /// periodic policy it waits for the timer. The returned status
    /// reflects staging; a transmit dropped by a full queue is logged
    /// and retried by the next timer tick or the next change, never
    /// resent on its own.
    pub fn set_new_tx_value(&mut self, new_value: &[T; N]) -> UpdateStatus {
        let mut status = UpdateStatus::default();
        status.value_changed = self.tx_value != *new_value;
        status.valid_value = self.local.is_valid(new_value);
        status.update_allowed = status.value_changed && status.valid_value;
        if !status.update_allowed {
            return status;
        }

        self.tx_value.clone_from(new_value);
        self.tx_change_count = self.tx_change_count.wrapping_add(1);
        status.update_successful = true;

        if self.policy.tx_on_change() {
            self.tx_now();
        } else if !self.policy.periodic_tx() {
            // RX-side policies never transmit locally staged values, but the
            // staged value still becomes authoritative under OnTransmit.
            if self.commit == CommitMode::OnTransmit {
                self.commit_staged();
            }
        }
        status
    }

    /// Alias for [`set_new_tx_value`](Self::set_new_tx_value); this is the
    /// local write path of the item.
    pub fn set_value(&mut self, new_value: &[T; N]) -> UpdateStatus {
        self.set_new_tx_value(new_value)
    }

    /// Stage a new outbound value from its canonical string form.
    pub fn set_value_from_string(&mut self, s: &str) -> UpdateStatus {
        let values: Vec<T> = match codec::decode_canonical(s, N) {
            Some(values) => values,
            None => {
                warn!("{}: rejected canonical string {:?}", self.name(), s);
                return UpdateStatus::rejected();
            }
        };
        let array: [T; N] = match values.try_into() {
            Ok(array) => array,
            Err(_) => return UpdateStatus::rejected(),
        };
        self.set_new_tx_value(&array)
    }

    /// Switch the transmission policy, restarting the periodic timer.
    pub fn set_policy(&mut self, policy: RxTxPolicy, now_ms: u64) {
        self.policy = policy;
        self.restart_timer(now_ms);
    }

    /// Change the periodic rate, restarting the periodic timer.
    pub fn set_rate(&mut self, rate_ms: u64, now_ms: u64) {
        self.rate_ms = rate_ms;
        self.restart_timer(now_ms);
    }

    fn restart_timer(&mut self, now_ms: u64) {
        self.next_tx_deadline_ms = if self.policy.periodic_tx() && self.rate_ms > 0 {
            Some(now_ms + self.rate_ms)
        } else {
            None
        };
    }

    /// Drive the periodic transmit timer.
    ///
    /// Arms on first call under a periodic policy; fires once per elapsed
    /// period thereafter.
    pub fn tick(&mut self, now_ms: u64) {
        if self.policy.periodic_tx() && self.next_tx_deadline_ms.is_none() {
            self.restart_timer(now_ms);
            return;
        }
        while let Some(deadline) = self.next_tx_deadline_ms {
            if now_ms < deadline {
                break;
            }
            self.tx_now();
            self.next_tx_deadline_ms = Some(deadline + self.rate_ms);
        }
    }

    /// Serialize the staged value and enqueue it on the link now.
    ///
    /// Only a successful enqueue commits the staged value (and only under
    /// [`CommitMode::OnTransmit`]); a drop leaves the store on its prior
    /// value.
    pub fn tx_now(&mut self) -> bool {
        self.send_staged(self.commit == CommitMode::OnTransmit)
    }

    fn send_staged(&mut self, commit_on_enqueue: bool) -> bool {
        let line = match serializer::serialize_envelope(
            self.local.name(),
            &self.tx_value,
            self.tx_change_count,
        ) {
            Ok(line) => line,
            Err(e) => {
                warn!("{}: transmit encode failed: {}", self.name(), e);
                return false;
            }
        };
        match self.sink.try_send_line(line) {
            Ok(()) => {
                if commit_on_enqueue {
                    self.commit_staged();
                }
                true
            }
            Err(e) => {
                debug!("{}: transmit dropped: {}", self.name(), e);
                false
            }
        }
    }

    fn commit_staged(&mut self) {
        let staged = self.tx_value.clone();
        let _ = self.local.set_value(&staged);
    }

    /// Borrow the RX shadow buffer (last applied inbound value).
    pub fn rx_value(&self) -> &[T; N] {
        &self.rx_value
    }
}

impl<T: DataValue, const N: usize> RxHandler for DataItem<T, N> {
    fn name(&self) -> &str {
        self.local.name()
    }

    /// Accept one inbound envelope.
    ///
    /// A receipt whose change count equals the last applied one is a
    /// duplicate and is ignored; there is no ordering comparison between
    /// counts, so a peer that reset its counter is still accepted.
    fn on_envelope(&mut self, envelope: &WireEnvelope) {
        let values: Vec<T> = match serializer::decode_values(envelope) {
            Ok(values) => values,
            Err(e) => {
                warn!("{}: inbound payload rejected: {}", self.name(), e);
                return;
            }
        };
        let array: [T; N] = match values.try_into() {
            Ok(array) => array,
            Err(values) => {
                warn!(
                    "{}: inbound arity {} does not match {}",
                    self.name(),
                    values.len(),
                    N
                );
                return;
            }
        };

        if self.last_rx_change_count == Some(envelope.change_count) {
            return;
        }
        self.last_rx_change_count = Some(envelope.change_count);
        self.rx_value = array;

        if self.commit == CommitMode::OnReceive {
            let received = self.rx_value.clone();
            let _ = self.local.set_value(&received);
        }

        if self.policy.echo() {
            // An echo is not a local change: it never commits, whatever the
            // commit mode; only commit-on-receive above touches the store.
            self.tx_value.clone_from(&self.rx_value);
            self.tx_change_count = self.tx_change_count.wrapping_add(1);
            self.send_staged(false);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};
    use st_shared::TransportError;

    /// Sink that records every accepted line and can simulate a full queue.
    #[derive(Default)]
    struct RecordingSink {
        lines: RefCell<Vec<String>>,
        full: Cell<bool>,
    }

    impl RecordingSink {
        fn take_lines(&self) -> Vec<String> {
            self.lines.take()
        }

        fn line_count(&self) -> usize {
            self.lines.borrow().len()
        }
    }

    impl MessageSink for RecordingSink {
        fn try_send_line(&self, line: String) -> Result<(), TransportError> {
            if self.full.get() {
                return Err(TransportError::QueueFull);
            }
            self.lines.borrow_mut().push(line);
            Ok(())
        }
    }

    fn envelope_for<T: DataValue>(name: &str, values: &[T], change_count: u32) -> WireEnvelope {
        let line = serializer::serialize_envelope(name, values, change_count).unwrap();
        serializer::deserialize_envelope(&line).unwrap()
    }

    #[test]
    fn test_on_change_transmits_and_commits() {
        let sink = Rc::new(RecordingSink::default());
        let mut item = DataItem::new(
            "Gain",
            [0i32],
            RxTxPolicy::TxOnChange,
            0,
            sink.clone(),
        );

        let status = item.set_value(&[42]);
        assert!(status.update_successful);
        assert_eq!(item.get_value(), [42]);

        let lines = sink.take_lines();
        assert_eq!(lines.len(), 1);
        let envelope = serializer::deserialize_envelope(&lines[0]).unwrap();
        assert_eq!(envelope.name, "Gain");
        assert_eq!(serializer::decode_values::<i32>(&envelope).unwrap(), [42]);
    }

    #[test]
    fn test_unchanged_value_does_not_transmit() {
        let sink = Rc::new(RecordingSink::default());
        let mut item = DataItem::new("Gain", [5i32], RxTxPolicy::TxOnChange, 0, sink.clone());

        let status = item.set_value(&[5]);
        assert!(!status.value_changed);
        assert_eq!(sink.line_count(), 0);
    }

    #[test]
    fn test_full_queue_leaves_store_on_prior_value() {
        let sink = Rc::new(RecordingSink::default());
        sink.full.set(true);
        let mut item = DataItem::new("Gain", [0i32], RxTxPolicy::TxOnChange, 0, sink.clone());

        let status = item.set_value(&[42]);
        // Staging succeeded, but the drop means nothing was committed.
        assert!(status.update_successful);
        assert_eq!(item.get_value(), [0]);
        assert_eq!(item.change_count(), 0);

        // Once the link drains, the next change goes through and commits.
        sink.full.set(false);
        assert!(item.set_value(&[43]).update_successful);
        assert_eq!(item.get_value(), [43]);
    }

    #[test]
    fn test_periodic_policy_waits_for_timer() {
        let sink = Rc::new(RecordingSink::default());
        let mut item = DataItem::new("Level", [0i32], RxTxPolicy::TxPeriodic, 100, sink.clone());
        item.tick(0);

        // A change under TxPeriodic does not transmit immediately.
        item.set_value(&[7]);
        assert_eq!(sink.line_count(), 0);

        item.tick(99);
        assert_eq!(sink.line_count(), 0);
        item.tick(100);
        assert_eq!(sink.line_count(), 1);
        assert_eq!(item.get_value(), [7]);
    }

    #[test]
    fn test_periodic_enqueues_once_per_period() {
        let sink = Rc::new(RecordingSink::default());
        let mut item = DataItem::new("Level", [1i32], RxTxPolicy::TxPeriodic, 100, sink.clone());
        item.tick(0);
        let mut now = 0;
        while now < 1050 {
            now += 10;
            item.tick(now);
        }
        assert_eq!(sink.line_count(), 10);
    }

    #[test]
    fn test_heartbeat_policy_has_both_paths() {
        let sink = Rc::new(RecordingSink::default());
        let mut item = DataItem::new(
            "Beat",
            [0i32],
            RxTxPolicy::TxOnChangeWithHeartbeat,
            100,
            sink.clone(),
        );
        item.tick(0);

        item.set_value(&[1]);
        assert_eq!(sink.line_count(), 1);

        item.tick(100);
        assert_eq!(sink.line_count(), 2);
    }

    #[test]
    fn test_set_policy_restarts_timer() {
        let sink = Rc::new(RecordingSink::default());
        let mut item = DataItem::new("Level", [0i32], RxTxPolicy::TxOnChange, 100, sink.clone());
        item.tick(0);
        item.tick(500);
        assert_eq!(sink.line_count(), 0);

        item.set_policy(RxTxPolicy::TxPeriodic, 500);
        item.tick(599);
        assert_eq!(sink.line_count(), 0);
        item.tick(600);
        assert_eq!(sink.line_count(), 1);

        item.set_policy(RxTxPolicy::RxOnly, 600);
        item.tick(2000);
        assert_eq!(sink.line_count(), 1);
    }

    #[test]
    fn test_rx_commit_on_receive() {
        let sink = Rc::new(RecordingSink::default());
        let mut item = DataItem::new("Remote", [0i32], RxTxPolicy::RxOnly, 0, sink.clone())
            .with_commit_mode(CommitMode::OnReceive);

        item.on_envelope(&envelope_for("Remote", &[9i32], 1));
        assert_eq!(item.get_value(), [9]);
        assert_eq!(item.rx_value(), &[9]);
        assert_eq!(sink.line_count(), 0);
    }

    #[test]
    fn test_rx_without_commit_keeps_store() {
        let sink = Rc::new(RecordingSink::default());
        let mut item = DataItem::new("Remote", [0i32], RxTxPolicy::RxOnly, 0, sink.clone());

        item.on_envelope(&envelope_for("Remote", &[9i32], 1));
        assert_eq!(item.get_value(), [0]);
        assert_eq!(item.rx_value(), &[9]);
    }

    #[test]
    fn test_duplicate_change_count_ignored() {
        let sink = Rc::new(RecordingSink::default());
        let mut item = DataItem::new("Remote", [0i32], RxTxPolicy::RxOnly, 0, sink.clone())
            .with_commit_mode(CommitMode::OnReceive);

        item.on_envelope(&envelope_for("Remote", &[9i32], 1));
        item.on_envelope(&envelope_for("Remote", &[9i32], 1));
        assert_eq!(item.change_count(), 1);

        // A reset peer restarting its counter is still accepted.
        item.on_envelope(&envelope_for("Remote", &[3i32], 0));
        assert_eq!(item.get_value(), [3]);
    }

    #[test]
    fn test_rx_echo_retransmits_once() {
        let sink = Rc::new(RecordingSink::default());
        let mut item = DataItem::new("Echoed", [0i32], RxTxPolicy::RxEcho, 0, sink.clone());

        item.on_envelope(&envelope_for("Echoed", &[42i32], 1));

        let lines = sink.take_lines();
        assert_eq!(lines.len(), 1);
        let envelope = serializer::deserialize_envelope(&lines[0]).unwrap();
        assert_eq!(serializer::decode_values::<i32>(&envelope).unwrap(), [42]);
        // Commit-on-receive is off: the authoritative store is untouched.
        assert_eq!(item.get_value(), [0]);
    }

    #[test]
    fn test_rx_type_mismatch_rejected() {
        let sink = Rc::new(RecordingSink::default());
        let mut item = DataItem::new("Remote", [0i32], RxTxPolicy::RxOnly, 0, sink.clone())
            .with_commit_mode(CommitMode::OnReceive);

        item.on_envelope(&envelope_for("Remote", &[1.5f32], 1));
        assert_eq!(item.get_value(), [0]);
    }

    #[test]
    fn test_validator_applies_to_staged_values() {
        let sink = Rc::new(RecordingSink::default());
        let mut item = DataItem::new("Step", [10i32], RxTxPolicy::TxOnChange, 0, sink.clone())
            .with_validator(ValidValueChecker::new(["10", "20", "30"]));

        let status = item.set_value(&[40]);
        assert!(!status.update_allowed);
        assert_eq!(sink.line_count(), 0);
        assert_eq!(item.get_value(), [10]);
    }
}
