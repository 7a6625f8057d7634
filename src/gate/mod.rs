// src/gate/mod.rs

//! Output gate: one program's output reaches the console at a time.
//!
//! The decision logic lives in the pure [`state`] machine; [`OutputGate`] is
//! the async shell around it. Every producer takes a [`GateTicket`]. A ticket
//! is either admitted immediately or carries a [`Turn`] that resolves once
//! the gate hands the slot over (or drains the queue).

pub mod state;

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::debug;

pub use state::{Acquired, GateState, Released, SlotId};

/// Pending admission to the console; resolves when the slot is handed over.
#[derive(Debug)]
pub struct Turn {
    rx: oneshot::Receiver<()>,
}

impl Turn {
    /// Wait for the slot. Returns immediately if the gate itself was dropped,
    /// so a producer can never be stranded.
    pub async fn wait(self) {
        let _ = self.rx.await;
    }
}

#[derive(Debug)]
pub enum Admission {
    Immediate,
    Pending(Turn),
}

/// A producer's registration with the gate.
#[derive(Debug)]
pub struct GateTicket {
    pub slot: SlotId,
    pub admission: Admission,
}

impl GateTicket {
    pub fn is_immediate(&self) -> bool {
        matches!(self.admission, Admission::Immediate)
    }
}

#[derive(Debug, Default)]
struct GateInner {
    state: GateState<oneshot::Sender<()>>,
    next_slot: SlotId,
}

/// Cloneable handle to a single gate. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct OutputGate {
    inner: Arc<Mutex<GateInner>>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new producer. The first producer on an idle gate is
    /// admitted immediately; everybody else queues in arrival order.
    pub fn acquire(&self) -> GateTicket {
        let (tx, rx) = oneshot::channel();
        let mut inner = self.lock();
        let slot = inner.next_slot;
        inner.next_slot += 1;

        match inner.state.acquire(slot, tx) {
            Acquired::Immediate => {
                debug!(slot, "output gate acquired immediately");
                GateTicket {
                    slot,
                    admission: Admission::Immediate,
                }
            }
            Acquired::Queued { position } => {
                debug!(slot, position, "output gate busy; queued");
                GateTicket {
                    slot,
                    admission: Admission::Pending(Turn { rx }),
                }
            }
        }
    }

    /// Give up `slot`. Hands the console to the next queued producer when
    /// `slot` was the holder.
    pub fn release(&self, slot: SlotId) {
        let mut inner = self.lock();
        let mut releasing = slot;

        loop {
            match inner.state.release(releasing) {
                Released::Handoff { next, waiter } => {
                    if waiter.send(()).is_ok() {
                        debug!(released = releasing, next, "output gate handed over");
                        return;
                    }
                    // The next producer went away without waiting for its
                    // turn; skip it.
                    debug!(slot = next, "queued producer vanished; skipping");
                    releasing = next;
                }
                Released::Idle => {
                    debug!(slot = releasing, "output gate released; now idle");
                    return;
                }
                Released::Dequeued => {
                    debug!(slot = releasing, "left output gate queue before its turn");
                    return;
                }
                Released::Unknown => {
                    debug!(slot = releasing, "release of unknown slot ignored");
                    return;
                }
            }
        }
    }

    /// Wake every queued producer and reset the gate to idle. Returns the
    /// number of producers woken.
    pub fn drain_all(&self) -> usize {
        let waiters = self.lock().state.drain_all();
        let count = waiters.len();
        for (slot, waiter) in waiters {
            if waiter.send(()).is_err() {
                debug!(slot, "drained producer already gone");
            }
        }
        debug!(count, "output gate drained");
        count
    }

    pub fn holder(&self) -> Option<SlotId> {
        self.lock().state.holder()
    }

    pub fn queued(&self) -> Vec<SlotId> {
        self.lock().state.queued()
    }

    pub fn is_idle(&self) -> bool {
        self.lock().state.is_idle()
    }

    fn lock(&self) -> MutexGuard<'_, GateInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
