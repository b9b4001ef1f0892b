//! Shared types for the acquisition pipeline: the raw [`Frame`] produced by a
//! camera, the [`annotate`] step that burns a timestamp onto it and encodes
//! it as a PPM-like [`EncodedFrame`], the [`store`] that persists it under a
//! numbered path, and the [`wire`] framing shared by both sides of the
//! network link.

pub mod annotate;
pub mod frame;
pub mod store;
pub mod wire;

pub use annotate::{AnnotationRecord, AnnotatorError, EncodedFrame, FrameAnnotator};
pub use frame::Frame;
pub use store::{LocalStore, StoreError};
pub use wire::{SENTINEL, WireError};
