//! Draws the annotation record onto a [`Frame`] and encodes it as a
//! PPM-like [`EncodedFrame`].
//!
//! The text-stamping approach (lay out glyphs with `rusttype`, alpha-blend
//! coverage into an RGB8 buffer) follows `font-drawing::stamp_frame` in the
//! broader pack, adapted to three fixed-anchor lines instead of one and
//! specialized to the plain interleaved `Vec<u8>` buffer used here instead
//! of the generic `machine-vision-formats` image traits.

use rusttype::{point, Font, Scale};

use crate::frame::Frame;

/// The three annotation strings burned onto a frame and also injected as
/// in-band comment lines in the encoded file.
#[derive(Debug, Clone)]
pub struct AnnotationRecord {
    pub datetime_str: String,
    pub sec: i64,
    pub msec: u32,
    pub host: String,
}

impl AnnotationRecord {
    pub fn now(host: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            datetime_str: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            sec: now.timestamp(),
            msec: now.timestamp_subsec_millis(),
            host: host.into(),
        }
    }

    fn lines(&self) -> [String; 3] {
        [
            self.datetime_str.clone(),
            format!("sec={} msec={}", self.sec, self.msec),
            format!("host={}", self.host),
        ]
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AnnotatorError {
    #[error("font could not be parsed")]
    BadFont,
    #[error("frame has no pixel data (width or height is zero)")]
    EmptyFrame,
}

/// A byte sequence: 3-byte magic, `#`-prefixed comment lines, then a plain
/// PPM header (`width height\nmaxval\n`) followed by raw RGB8 pixel data.
#[derive(Debug, Clone, Default)]
pub struct EncodedFrame(Vec<u8>);

impl EncodedFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

const MAGIC: &[u8; 3] = b"P6\n";
/// Row anchors for the three annotation lines, chosen so default-sized
/// (640x480) frames keep the text clear of the frame's vertical center.
const LINE_ANCHORS_Y: [f32; 3] = [20.0, 50.0, 80.0];
const SCALE: f32 = 24.0;

pub struct FrameAnnotator {
    font: Font<'static>,
}

impl FrameAnnotator {
    pub fn new() -> Result<Self, AnnotatorError> {
        let font = Font::try_from_bytes(ttf_firacode::REGULAR as &[u8]).ok_or(AnnotatorError::BadFont)?;
        Ok(Self { font })
    }

    /// Draws `record`'s three lines onto a copy of `frame` and encodes the
    /// result, injecting the same three strings as comment lines.
    pub fn annotate(&self, frame: &Frame, record: &AnnotationRecord) -> Result<EncodedFrame, AnnotatorError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(AnnotatorError::EmptyFrame);
        }
        let mut pixels = frame.data.clone();
        let stride = frame.stride();
        for (line, y0) in record.lines().iter().zip(LINE_ANCHORS_Y) {
            stamp_line(&mut pixels, frame.width, frame.height, stride, &self.font, line, y0);
        }

        let mut out = Vec::with_capacity(pixels.len() + 128);
        out.extend_from_slice(MAGIC);
        for line in record.lines() {
            out.push(b'#');
            out.extend_from_slice(line.as_bytes());
            out.push(b'\n');
        }
        out.extend_from_slice(format!("{} {}\n255\n", frame.width, frame.height).as_bytes());
        out.extend_from_slice(&pixels);

        Ok(EncodedFrame(out))
    }
}

fn put_pixel(buf: &mut [u8], stride: usize, width: u32, height: u32, x: i32, y: i32, rgb: [u8; 3], alpha: f32) {
    if x < 0 || y < 0 || x as u32 >= width || y as u32 >= height {
        return;
    }
    let pix_start = y as usize * stride + x as usize * 3;
    let p = 1.0 - alpha;
    let q = alpha;
    for c in 0..3 {
        let old = buf[pix_start + c] as f32;
        buf[pix_start + c] = (old * p + rgb[c] as f32 * q).round() as u8;
    }
}

fn stamp_line(buf: &mut [u8], width: u32, height: u32, stride: usize, font: &Font, text: &str, y0: f32) {
    let scale = Scale::uniform(SCALE);
    let v_metrics = font.v_metrics(scale);
    let x0 = 8.0;
    let colour = [255u8, 255, 0];

    let glyphs: Vec<_> = font.layout(text, scale, point(x0, y0 + v_metrics.ascent)).collect();
    for glyph in glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                put_pixel(
                    buf,
                    stride,
                    width,
                    height,
                    gx as i32 + bb.min.x,
                    gy as i32 + bb.min.y,
                    colour,
                    v,
                );
            });
        }
    }
}
