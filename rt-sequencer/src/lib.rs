//! The periodic task sequencer: releases S1/S2 at sub-multiples of a master
//! frequency, records per-release timing, and the hand-off discipline that
//! orders FrameCapture before FrameShip within a cycle.

pub mod handoff;
pub mod sched;
pub mod sequencer;
pub mod ticket;
pub mod timer;

pub use handoff::HandoffLock;
pub use sched::{promote_s1, promote_s2, promote_sequencer};
pub use sequencer::{RunStats, Sequencer, SequencerConfig, SequencerError};
pub use ticket::{Release, ReleaseTicket};
