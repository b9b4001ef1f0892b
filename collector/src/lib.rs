//! Library half of the collector binary: AcceptLoop, FrameReceiver, daemon
//! mode, and logging init, split out so integration tests can drive the
//! accept loop directly.

pub mod accept_loop;
pub mod daemon;
pub mod logging;
pub mod receiver;
