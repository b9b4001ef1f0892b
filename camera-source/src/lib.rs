//! `FrameSource`: opens a camera device by integer index and yields raster
//! frames.
//!
//! Modeled on `ci2::CameraModule`/`ci2::Camera` (open by name/index, blocking
//! `next_frame`, a distinguished "no frame this time" error that the caller
//! may choose to treat as a skipped job rather than fatal). The real vision
//! library and device driver are out of scope (spec.md §1); `TestCamera`
//! stands in for them.

use frame_core::Frame;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("failed to open camera device {index}: {reason}")]
    OpenFailed { index: u32, reason: String },
    #[error("no frame available this cycle")]
    NoFrame,
}

/// Opens a camera device and yields raw raster frames.
pub trait FrameSource: Send {
    /// Blocks until a raster is available.
    fn next_frame(&mut self) -> Result<Frame, SourceError>;
}

/// Opens device `index`. Failure here is startup-fatal, per spec.md §4.1.
pub fn open(index: u32) -> Result<TestCamera, SourceError> {
    TestCamera::open(index)
}

/// A deterministic synthetic camera used in place of real capture hardware.
///
/// Emits a `width` x `height` RGB8 raster whose pixel values are a function
/// of the frame counter, so distinct frames are distinguishable bytewise.
pub struct TestCamera {
    index: u32,
    width: u32,
    height: u32,
    counter: u64,
}

impl TestCamera {
    pub const DEFAULT_WIDTH: u32 = 64;
    pub const DEFAULT_HEIGHT: u32 = 48;

    pub fn open(index: u32) -> Result<Self, SourceError> {
        // A real driver would fail here for a nonexistent device index; we
        // only reject an arbitrarily chosen out-of-range sentinel so tests
        // can exercise the startup-fatal path.
        if index == u32::MAX {
            return Err(SourceError::OpenFailed {
                index,
                reason: "device index out of range".into(),
            });
        }
        Ok(Self {
            index,
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            counter: 0,
        })
    }

    pub fn device_index(&self) -> u32 {
        self.index
    }
}

impl FrameSource for TestCamera {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        let n = self.counter;
        self.counter += 1;
        let mut data = vec![0u8; self.width as usize * self.height as usize * 3];
        for (i, px) in data.chunks_mut(3).enumerate() {
            px[0] = (i as u64 ^ n).wrapping_mul(37) as u8;
            px[1] = (i as u64).wrapping_add(n).wrapping_mul(17) as u8;
            px[2] = n as u8;
        }
        Ok(Frame::new(self.width, self.height, data, chrono::Utc::now()))
    }
}
