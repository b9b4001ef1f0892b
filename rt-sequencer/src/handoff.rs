//! `HandoffLock`: the happens-before edge between `FrameCapture` and
//! `FrameShip` within one cycle.
//!
//! Same underlying shape as [`crate::ticket::ReleaseTicket`] (a queued
//! signal), but carries the slot identity produced by FrameCapture so
//! FrameShip never has to re-derive "the current slot" from shared mutable
//! state -- the pipeline has depth 1 (spec.md §5: "S1 of cycle k may
//! overlap S2 of cycle k-1"), so a bare shared counter would be racy. Its
//! initial state has no pending value, so FrameShip's first acquire blocks
//! until the first frame is produced (spec.md §5).

use crossbeam_channel::{unbounded, Receiver, RecvError, Sender};

pub struct HandoffLock<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> HandoffLock<T> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Called by FrameCapture once LocalStore::write has returned (or been
    /// skipped on failure); `value` identifies the slot FrameShip should
    /// act on next.
    pub fn release(&self, value: T) {
        let _ = self.tx.send(value);
    }

    /// Called by FrameShip before it reads the current slot. Blocks until
    /// released.
    pub fn acquire(&self) -> Result<T, RecvError> {
        self.rx.recv()
    }
}

impl<T> Clone for HandoffLock<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone(), rx: self.rx.clone() }
    }
}

impl<T> Default for HandoffLock<T> {
    fn default() -> Self {
        Self::new()
    }
}
