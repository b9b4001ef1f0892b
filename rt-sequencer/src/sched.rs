//! Thin wrappers around the POSIX realtime-scheduling syscalls.
//!
//! Follows `posix-scheduler`'s `syscall!` macro pattern (a `-1` return
//! becomes `std::io::Error::last_os_error()`), restricted to the subset the
//! Sequencer needs: promoting the calling thread to `SCHED_FIFO` at a given
//! static priority. `pid = 0` targets the calling thread, so each service
//! thread promotes itself on startup.
//!
//! Priorities are derived from the kernel's own `SCHED_FIFO` ceiling rather
//! than a hardcoded constant, matching `original_source/camera_socket/seqgen.c`
//! (`rt_max_prio = sched_get_priority_max(SCHED_FIFO)`) and spec.md §4.5 step
//! 1: the Sequencer runs at the highest available `SCHED_FIFO` priority, S1
//! one below it, S2 one below that.

use std::io::{Error, Result};

macro_rules! syscall {
    ($ex:expr) => {{
        let result = unsafe { $ex };
        if result == -1 {
            return Err(Error::last_os_error());
        }
        result
    }};
}

/// Promotes the calling thread to strict fixed-priority preemptive
/// scheduling (`SCHED_FIFO`) at `priority`.
///
/// Startup-fatal on failure, per spec.md §7: the caller should propagate the
/// error up to `main` and exit non-zero rather than run at default priority.
#[cfg(target_os = "linux")]
pub fn promote_fifo(priority: i32) -> Result<()> {
    let sched_param = libc::sched_param { sched_priority: priority };
    syscall!(libc::sched_setscheduler(0, libc::SCHED_FIFO, &sched_param));
    Ok(())
}

/// CPU-pin is advisory (spec.md §4.5); left unimplemented on non-Linux and
/// a best-effort no-op here since pinning is not required for correctness.
#[cfg(not(target_os = "linux"))]
pub fn promote_fifo(_priority: i32) -> Result<()> {
    Ok(())
}

/// The kernel's ceiling for `SCHED_FIFO` priorities (typically 99 on Linux).
#[cfg(target_os = "linux")]
pub fn max_priority() -> Result<i32> {
    Ok(syscall!(libc::sched_get_priority_max(libc::SCHED_FIFO)))
}

#[cfg(not(target_os = "linux"))]
pub fn max_priority() -> Result<i32> {
    Ok(0)
}

/// Promotes the calling thread to the Sequencer's priority: the kernel's
/// `SCHED_FIFO` maximum, per spec.md §4.5 step 1.
pub fn promote_sequencer() -> Result<()> {
    promote_fifo(max_priority()?)
}

/// Promotes the calling thread to S1's priority: one below the Sequencer.
pub fn promote_s1() -> Result<()> {
    promote_fifo(max_priority()? - 1)
}

/// Promotes the calling thread to S2's priority: two below the Sequencer.
pub fn promote_s2() -> Result<()> {
    promote_fifo(max_priority()? - 2)
}
