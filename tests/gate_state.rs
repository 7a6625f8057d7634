// tests/gate_state.rs

use std::collections::VecDeque;

use proptest::prelude::*;
use parrun::gate::{Acquired, GateState, Released, SlotId};

#[test]
fn first_acquire_is_immediate_and_later_ones_queue_in_order() {
    let mut gate: GateState<&str> = GateState::new();

    assert!(gate.is_idle());
    assert_eq!(gate.acquire(1, "w1"), Acquired::Immediate);
    assert_eq!(gate.acquire(2, "w2"), Acquired::Queued { position: 0 });
    assert_eq!(gate.acquire(3, "w3"), Acquired::Queued { position: 1 });

    assert_eq!(gate.holder(), Some(1));
    assert_eq!(gate.queued(), vec![2, 3]);
}

#[test]
fn release_hands_over_to_queue_head_fifo() {
    let mut gate: GateState<&str> = GateState::new();
    gate.acquire(1, "w1");
    gate.acquire(2, "w2");
    gate.acquire(3, "w3");

    assert_eq!(
        gate.release(1),
        Released::Handoff {
            next: 2,
            waiter: "w2"
        }
    );
    assert_eq!(gate.holder(), Some(2));

    assert_eq!(
        gate.release(2),
        Released::Handoff {
            next: 3,
            waiter: "w3"
        }
    );
    assert_eq!(gate.release(3), Released::Idle);
    assert!(gate.is_idle());
}

#[test]
fn releasing_a_queued_slot_only_removes_it() {
    let mut gate: GateState<&str> = GateState::new();
    gate.acquire(1, "w1");
    gate.acquire(2, "w2");
    gate.acquire(3, "w3");

    assert_eq!(gate.release(2), Released::Dequeued);
    assert_eq!(gate.holder(), Some(1));
    assert_eq!(gate.queued(), vec![3]);

    // The removed slot is skipped on the next handoff.
    assert_eq!(
        gate.release(1),
        Released::Handoff {
            next: 3,
            waiter: "w3"
        }
    );
}

#[test]
fn release_of_unknown_slot_is_ignored() {
    let mut gate: GateState<()> = GateState::new();
    assert_eq!(gate.release(7), Released::Unknown);

    gate.acquire(1, ());
    assert_eq!(gate.release(7), Released::Unknown);
    assert_eq!(gate.holder(), Some(1));
}

#[test]
fn drain_all_returns_waiters_in_order_and_resets() {
    let mut gate: GateState<&str> = GateState::new();
    gate.acquire(1, "w1");
    gate.acquire(2, "w2");
    gate.acquire(3, "w3");

    let drained = gate.drain_all();
    assert_eq!(drained, vec![(2, "w2"), (3, "w3")]);
    assert!(gate.is_idle());

    // The old holder finishing afterwards must not disturb anything.
    assert_eq!(gate.release(1), Released::Unknown);
    assert!(gate.drain_all().is_empty());
}

#[derive(Debug, Clone)]
enum Op {
    Acquire,
    ReleaseHolder,
    ReleaseQueued(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Acquire),
        2 => Just(Op::ReleaseHolder),
        1 => any::<usize>().prop_map(Op::ReleaseQueued),
    ]
}

proptest! {
    /// The gate behaves like a single holder plus a FIFO queue, whatever the
    /// sequence of acquires and releases.
    #[test]
    fn gate_matches_fifo_model(ops in proptest::collection::vec(op_strategy(), 1..64)) {
        let mut gate: GateState<SlotId> = GateState::new();
        let mut model_holder: Option<SlotId> = None;
        let mut model_queue: VecDeque<SlotId> = VecDeque::new();
        let mut next: SlotId = 0;

        for op in ops {
            match op {
                Op::Acquire => {
                    let slot = next;
                    next += 1;
                    let acquired = gate.acquire(slot, slot);
                    if model_holder.is_none() {
                        model_holder = Some(slot);
                        prop_assert_eq!(acquired, Acquired::Immediate);
                    } else {
                        model_queue.push_back(slot);
                        prop_assert_eq!(acquired, Acquired::Queued { position: model_queue.len() - 1 });
                    }
                }
                Op::ReleaseHolder => {
                    if let Some(holder) = model_holder {
                        let released = gate.release(holder);
                        match model_queue.pop_front() {
                            Some(head) => {
                                prop_assert_eq!(released, Released::Handoff { next: head, waiter: head });
                                model_holder = Some(head);
                            }
                            None => {
                                prop_assert_eq!(released, Released::Idle);
                                model_holder = None;
                            }
                        }
                    }
                }
                Op::ReleaseQueued(i) => {
                    if !model_queue.is_empty() {
                        let slot = model_queue.remove(i % model_queue.len()).unwrap();
                        prop_assert_eq!(gate.release(slot), Released::Dequeued);
                    }
                }
            }

            // At most one holder, and it never also sits in the queue.
            prop_assert_eq!(gate.holder(), model_holder);
            prop_assert_eq!(gate.queued(), model_queue.iter().copied().collect::<Vec<_>>());
            if let Some(holder) = gate.holder() {
                prop_assert!(!gate.queued().contains(&holder));
            }
        }

        let drained: Vec<SlotId> = gate.drain_all().into_iter().map(|(slot, _)| slot).collect();
        prop_assert_eq!(drained, model_queue.into_iter().collect::<Vec<_>>());
        prop_assert!(gate.is_idle());
    }
}
