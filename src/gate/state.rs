// src/gate/state.rs

//! Pure output-gate state machine.
//!
//! `GateState` decides which slot may write to the shared console streams.
//! It has no channels, no Tokio types and performs no IO; the waiter handle
//! `W` is whatever the async shell uses to wake a queued slot (a oneshot
//! sender in production, plain values in tests).
//!
//! States:
//! - `Idle`: nobody is writing.
//! - `Active { holder, queue }`: `holder` owns the console; `queue` holds the
//!   slots waiting for it, oldest first. A non-empty queue is the "waiting"
//!   case.

use std::collections::VecDeque;

/// Identifier handed out per registered output producer.
pub type SlotId = u64;

/// Result of [`GateState::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquired {
    /// The slot became the holder; its output may flow immediately.
    Immediate,
    /// The slot was appended to the wait queue at the given 0-based position.
    Queued { position: usize },
}

/// Result of [`GateState::release`].
#[derive(Debug, PartialEq, Eq)]
pub enum Released<W> {
    /// The holder released and the queue head is now active; the shell must
    /// wake it through `waiter`.
    Handoff { next: SlotId, waiter: W },
    /// The holder released with nobody waiting.
    Idle,
    /// The slot was still queued; it was removed and its waiter discarded.
    Dequeued,
    /// The slot is neither holder nor queued (already released or drained).
    Unknown,
}

#[derive(Debug)]
pub enum GateState<W> {
    Idle,
    Active {
        holder: SlotId,
        queue: VecDeque<(SlotId, W)>,
    },
}

impl<W> Default for GateState<W> {
    fn default() -> Self {
        GateState::Idle
    }
}

impl<W> GateState<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the slot. `waiter` is kept only when the slot has to queue.
    pub fn acquire(&mut self, slot: SlotId, waiter: W) -> Acquired {
        match self {
            GateState::Idle => {
                *self = GateState::Active {
                    holder: slot,
                    queue: VecDeque::new(),
                };
                Acquired::Immediate
            }
            GateState::Active { holder, .. } if *holder == slot => Acquired::Immediate,
            GateState::Active { queue, .. } => {
                if let Some(position) = queue.iter().position(|(id, _)| *id == slot) {
                    return Acquired::Queued { position };
                }
                queue.push_back((slot, waiter));
                Acquired::Queued {
                    position: queue.len() - 1,
                }
            }
        }
    }

    /// Give up the slot, either as holder or as a queued waiter.
    pub fn release(&mut self, slot: SlotId) -> Released<W> {
        let state = std::mem::take(self);

        let (next_state, released) = match state {
            GateState::Idle => (GateState::Idle, Released::Unknown),
            GateState::Active { holder, mut queue } if holder == slot => match queue.pop_front() {
                Some((next, waiter)) => (
                    GateState::Active {
                        holder: next,
                        queue,
                    },
                    Released::Handoff { next, waiter },
                ),
                None => (GateState::Idle, Released::Idle),
            },
            GateState::Active { holder, mut queue } => {
                let released = match queue.iter().position(|(id, _)| *id == slot) {
                    Some(index) => {
                        queue.remove(index);
                        Released::Dequeued
                    }
                    None => Released::Unknown,
                };
                (GateState::Active { holder, queue }, released)
            }
        };

        *self = next_state;
        released
    }

    /// Empty the queue and return every waiter in FIFO order, leaving the
    /// gate `Idle`. The current holder (if any) keeps writing; releasing it
    /// later is a no-op.
    pub fn drain_all(&mut self) -> Vec<(SlotId, W)> {
        match std::mem::take(self) {
            GateState::Idle => Vec::new(),
            GateState::Active { queue, .. } => queue.into_iter().collect(),
        }
    }

    pub fn holder(&self) -> Option<SlotId> {
        match self {
            GateState::Idle => None,
            GateState::Active { holder, .. } => Some(*holder),
        }
    }

    /// Queued slots, oldest first.
    pub fn queued(&self) -> Vec<SlotId> {
        match self {
            GateState::Idle => Vec::new(),
            GateState::Active { queue, .. } => queue.iter().map(|(id, _)| *id).collect(),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, GateState::Idle)
    }
}
