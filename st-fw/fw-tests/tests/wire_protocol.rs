//! Wire-level behavior: framing bounds, corruption, and decode accounting.

use std::cell::RefCell;
use std::rc::Rc;

use fw_tests::LinkHarness;
use st_model::{CommitMode, MAX_MESSAGE_LENGTH, RxTxPolicy};
use st_sync::{DataItem, serializer};

#[test_log::test]
fn test_corrupted_payload_is_rejected_end_to_end() {
    let mut harness = LinkHarness::new();
    let item = Rc::new(RefCell::new(
        DataItem::new("Level", [0i32], RxTxPolicy::RxOnly, 0, harness.sender())
            .with_commit_mode(CommitMode::OnReceive),
    ));
    harness.manager.register(item.clone());

    let line = serializer::serialize_envelope("Level", &[42i32], 1).unwrap();
    // Flip one hex digit in the payload; the checksum no longer matches.
    let corrupted = line.replace("2A000000", "2A000001");
    assert_ne!(line, corrupted);

    harness.link.inject_line(&corrupted);
    harness.manager.poll();

    assert_eq!(item.borrow().get_value(), [0]);
    assert_eq!(harness.manager.stats().failure_count(), 1);

    // The intact line still goes through afterwards.
    harness.link.inject_line(&line);
    harness.manager.poll();
    assert_eq!(item.borrow().get_value(), [42]);
    assert_eq!(harness.manager.stats().ok_count(), 1);
}

#[test]
fn test_oversized_partial_line_discarded_without_delivery() {
    let mut harness = LinkHarness::new();

    // A line that never terminates within the frame bound.
    let mut oversized = vec![b'{'; MAX_MESSAGE_LENGTH + 100];
    oversized.push(b'\n');
    harness.link.inject_bytes(&oversized);

    assert_eq!(harness.link.overflows(), 1);
    harness.manager.poll();
    assert_eq!(harness.manager.stats().ok_count(), 0);
}

#[test]
fn test_byte_dribble_reassembles_into_envelope() {
    let mut harness = LinkHarness::new();
    let item = Rc::new(RefCell::new(
        DataItem::new("Level", [0i32], RxTxPolicy::RxOnly, 0, harness.sender())
            .with_commit_mode(CommitMode::OnReceive),
    ));
    harness.manager.register(item.clone());

    let mut line = serializer::serialize_envelope("Level", &[9i32], 1)
        .unwrap()
        .into_bytes();
    line.push(b'\n');

    // Deliver one byte at a time, polling in between: no partial dispatch.
    for byte in line {
        harness.link.inject_bytes(&[byte]);
        harness.manager.poll();
    }
    assert_eq!(item.borrow().get_value(), [9]);
    assert_eq!(harness.manager.stats().ok_count(), 1);
}

#[test]
fn test_interleaved_values_keep_submission_order() {
    let mut harness = LinkHarness::new();
    let sender = harness.sender();

    let mut producer_a = DataItem::new("A", [0i32], RxTxPolicy::TxOnChange, 0, sender.clone());
    let mut producer_b = DataItem::new("B", [0i32], RxTxPolicy::TxOnChange, 0, sender);

    producer_a.set_value(&[1]);
    producer_b.set_value(&[2]);
    producer_a.set_value(&[3]);

    let names: Vec<String> = harness
        .link
        .drain_outbound()
        .iter()
        .map(|l| serializer::deserialize_envelope(l).unwrap().name)
        .collect();
    assert_eq!(names, ["A", "B", "A"]);
}

#[test]
fn test_queue_full_drops_are_counted() {
    let mut harness = LinkHarness::new();
    let sender = harness.sender();
    let mut item = DataItem::new("Spam", [0i32], RxTxPolicy::TxOnChange, 0, sender.clone());

    // The TX queue holds QUEUE_DEPTH lines; everything beyond that drops.
    for i in 1..=(fw_core::QUEUE_DEPTH as i32 + 5) {
        item.set_value(&[i]);
    }
    assert_eq!(sender.drops(), 5);
    assert_eq!(harness.link.drain_outbound().len(), fw_core::QUEUE_DEPTH);
}
