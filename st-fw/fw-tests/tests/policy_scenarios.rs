//! End-to-end transmission policy scenarios over a fake link.

use std::cell::RefCell;
use std::rc::Rc;

use fw_tests::LinkHarness;
use st_model::{CommitMode, RxTxPolicy};
use st_shared::TimeProvider;
use st_sync::{DataItem, serializer};

fn wire_line<T: st_model::DataValue>(name: &str, values: &[T], change_count: u32) -> String {
    serializer::serialize_envelope(name, values, change_count).unwrap()
}

#[test_log::test]
fn test_periodic_item_enqueues_ten_messages_in_1050_ms() {
    let mut harness = LinkHarness::new();
    let item = Rc::new(RefCell::new(DataItem::new(
        "Level",
        [42i32],
        RxTxPolicy::TxPeriodic,
        100,
        harness.sender(),
    )));
    harness.manager.register(item.clone());

    item.borrow_mut().tick(harness.time.now_ms());
    while harness.time.now_ms() < 1050 {
        harness.time.advance(10);
        item.borrow_mut().tick(harness.time.now_ms());
    }

    let outbound = harness.link.drain_outbound();
    assert_eq!(outbound.len(), 10);
    for line in &outbound {
        let envelope = serializer::deserialize_envelope(line).unwrap();
        assert_eq!(envelope.name, "Level");
        assert_eq!(serializer::decode_values::<i32>(&envelope).unwrap(), [42]);
    }
}

#[test_log::test]
fn test_rx_echo_retransmits_exactly_once_without_commit() {
    let mut harness = LinkHarness::new();
    let item = Rc::new(RefCell::new(DataItem::new(
        "Echoed",
        [0i32],
        RxTxPolicy::RxEcho,
        0,
        harness.sender(),
    )));
    harness.manager.register(item.clone());

    harness.link.inject_line(&wire_line("Echoed", &[42i32], 1));
    harness.manager.poll();

    let outbound = harness.link.drain_outbound();
    assert_eq!(outbound.len(), 1);
    let envelope = serializer::deserialize_envelope(&outbound[0]).unwrap();
    assert_eq!(serializer::decode_values::<i32>(&envelope).unwrap(), [42]);

    // Commit-on-receive is disabled: the authoritative store is untouched.
    assert_eq!(item.borrow().get_value(), [0]);

    // The duplicate is suppressed, so nothing further goes out.
    harness.link.inject_line(&wire_line("Echoed", &[42i32], 1));
    harness.manager.poll();
    assert!(harness.link.drain_outbound().is_empty());
}

#[test]
fn test_on_change_transmits_immediately() {
    let mut harness = LinkHarness::new();
    let item = Rc::new(RefCell::new(DataItem::new(
        "Gain",
        [0.0f32],
        RxTxPolicy::TxOnChange,
        0,
        harness.sender(),
    )));
    harness.manager.register(item.clone());

    item.borrow_mut().set_value(&[0.5]);
    assert_eq!(harness.link.drain_outbound().len(), 1);
    assert_eq!(item.borrow().get_value(), [0.5]);

    // Unchanged writes stay off the wire.
    item.borrow_mut().set_value(&[0.5]);
    assert!(harness.link.drain_outbound().is_empty());
}

#[test]
fn test_rx_only_commit_on_receive_updates_store() {
    let mut harness = LinkHarness::new();
    let item = Rc::new(RefCell::new(
        DataItem::new("Remote", [0i32], RxTxPolicy::RxOnly, 0, harness.sender())
            .with_commit_mode(CommitMode::OnReceive),
    ));
    harness.manager.register(item.clone());

    harness.link.inject_line(&wire_line("Remote", &[7i32], 1));
    harness.manager.poll();

    assert_eq!(item.borrow().get_value(), [7]);
    assert_eq!(item.borrow().change_count(), 1);
    // RxOnly never transmits.
    assert!(harness.link.drain_outbound().is_empty());
}

#[test]
fn test_heartbeat_sends_on_change_and_on_timer() {
    let mut harness = LinkHarness::new();
    let item = Rc::new(RefCell::new(DataItem::new(
        "State",
        [0u8],
        RxTxPolicy::TxOnChangeWithHeartbeat,
        200,
        harness.sender(),
    )));
    harness.manager.register(item.clone());

    item.borrow_mut().tick(harness.time.now_ms());
    item.borrow_mut().set_value(&[1]);
    assert_eq!(harness.link.drain_outbound().len(), 1);

    harness.time.advance(200);
    item.borrow_mut().tick(harness.time.now_ms());
    assert_eq!(harness.link.drain_outbound().len(), 1);
}

#[test]
fn test_two_items_share_one_link() {
    let mut harness = LinkHarness::new();
    let amplitude = Rc::new(RefCell::new(
        DataItem::new("Amplitude", [0.0f32], RxTxPolicy::RxOnly, 0, harness.sender())
            .with_commit_mode(CommitMode::OnReceive),
    ));
    let volume = Rc::new(RefCell::new(
        DataItem::new("Volume", [0i32], RxTxPolicy::RxOnly, 0, harness.sender())
            .with_commit_mode(CommitMode::OnReceive),
    ));
    harness.manager.register(amplitude.clone());
    harness.manager.register(volume.clone());

    harness.link.inject_line(&wire_line("Volume", &[60i32], 1));
    harness.link.inject_line(&wire_line("Amplitude", &[0.25f32], 1));
    harness.link.inject_line(&wire_line("Unknown", &[1i32], 1));
    harness.manager.poll();

    assert_eq!(amplitude.borrow().get_value(), [0.25]);
    assert_eq!(volume.borrow().get_value(), [60]);
    assert_eq!(harness.manager.unmatched(), 1);
}
