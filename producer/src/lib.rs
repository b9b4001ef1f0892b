//! Library half of the producer binary: FrameCapture and FrameShip service
//! bodies, plus logging init. Split out from `main.rs` so integration tests
//! can drive the pipeline directly, the way the pack splits e.g. `ci2` from
//! `ci2-cli`.

pub mod capture;
pub mod logging;
pub mod ship;
