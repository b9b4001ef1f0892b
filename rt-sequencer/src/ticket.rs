//! `ReleaseTicket`: a counted semaphore posted by the Sequencer and consumed
//! by a released service.
//!
//! spec.md §9 flags the original's mutex-as-latch rendezvous as UB-prone
//! ("unlocking an already-unlocked mutex") and recommends a proper counted
//! primitive instead; this wraps a `crossbeam_channel` unbounded queue,
//! which the pack already uses pervasively for inter-thread signaling
//! (`braid-triggerbox`, `flydra2-mainbrain`). Every post is queued, so none
//! is ever lost silently -- the invariant spec.md §3 requires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Outcome of waiting on a `ReleaseTicket`.
#[derive(Debug, PartialEq, Eq)]
pub enum Release {
    /// The service is released to run this cycle.
    Go,
    /// The abort flag was observed; the service should exit.
    Abort,
}

#[derive(Clone)]
pub struct ReleaseTicket {
    tx: Sender<()>,
    rx: Receiver<()>,
    abort: Arc<AtomicBool>,
}

impl ReleaseTicket {
    pub fn new(abort: Arc<AtomicBool>) -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx, abort }
    }

    /// Posts one release. Called by the Sequencer.
    pub fn post(&self) {
        // An unbounded channel never blocks and the receiver is held by the
        // same process for the lifetime of the run, so this cannot fail.
        let _ = self.tx.send(());
    }

    /// Waits for a release, or for the post-abort wakeup. Called by the
    /// released service at the top of its loop.
    pub fn wait(&self) -> Release {
        let _ = self.rx.recv();
        if self.abort.load(Ordering::Acquire) {
            Release::Abort
        } else {
            Release::Go
        }
    }
}
