//! The master-period rendezvous.
//!
//! spec.md §4.5 calls for "a kernel-backed one-shot-rearmed timer with
//! interval `P_seq`" whose callback "signals a rendezvous object". We use a
//! dedicated thread sleeping to successive absolute deadlines (so it rearms
//! without drift, the way a POSIX interval timer would) and a bounded(1)
//! `crossbeam_channel` as the single-slot rendezvous -- this is the
//! "proper...binary semaphore" spec.md §9's Design Notes calls for in place
//! of the original's mutex-as-latch.
//!
//! `original_source/camera_socket/seqgen.c` hard-codes the timer interval to
//! one second regardless of its configuration macro (spec.md §9); here the
//! interval is always `period`, taken from the caller's configuration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver};

pub struct Timer {
    rx: Receiver<()>,
    stop: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl Timer {
    /// Spawns the background thread that ticks every `period`.
    pub fn start(period: Duration) -> Self {
        let (tx, rx) = bounded(1);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = stop.clone();
        let handle = std::thread::spawn(move || {
            let mut next = Instant::now() + period;
            while !stop_thread.load(Ordering::Acquire) {
                let now = Instant::now();
                if now < next {
                    std::thread::sleep(next - now);
                }
                next += period;
                // A full channel means the previous tick has not yet been
                // consumed; the extra wake is absorbed rather than queued,
                // per spec.md §4.5's "rendezvous absorbs one extra wake".
                let _ = tx.try_send(());
            }
        });
        Self { rx, stop, handle: Some(handle) }
    }

    /// Waits for the next tick. Returns `true` if a tick was already
    /// pending (i.e. the sequencer body overran the period and this
    /// iteration begins with zero idle) -- the "looping delay" spec.md
    /// §4.5 describes as an observable metric.
    pub fn wait(&self) -> bool {
        if self.rx.try_recv().is_ok() {
            true
        } else {
            let _ = self.rx.recv();
            false
        }
    }

    /// Stops and joins the timer thread.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_roughly_on_period() {
        let timer = Timer::start(Duration::from_millis(10));
        let start = Instant::now();
        for _ in 0..3 {
            timer.wait();
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(20), "elapsed={elapsed:?}");
        timer.stop();
    }
}
