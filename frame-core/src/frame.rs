//! The raw raster produced by [`crate::FrameAnnotator`]'s caller.

/// A raster captured from a camera: RGB8, channel-interleaved, row-major.
///
/// The stride is always `width * 3`; cameras that pad rows are expected to
/// have already been copied into a packed buffer by `FrameSource`.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub captured_at: chrono::DateTime<chrono::Utc>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, captured_at: chrono::DateTime<chrono::Utc>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 3);
        Self {
            width,
            height,
            data,
            captured_at,
        }
    }

    pub fn stride(&self) -> usize {
        self.width as usize * 3
    }
}
