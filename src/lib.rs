//! RFB Compositor Library
//!
//! This crate provides the framebuffer half of a VNC viewer: sizing and
//! allocating the local pixel store, and applying fill, raw bitmap and
//! copy-rectangle updates to it for 8, 16 and 32 bits per pixel.
//!
//! # Modules
//!
//! - `vnc`: Contains the framebuffer, pixel operations and update sequencing.

pub mod vnc;

pub use vnc::compositor::{BatchSummary, Compositor, NullCompositor, UpdateDirective, UpdateSink};
pub use vnc::config::{CompositorConfig, DEFAULT_MAX_FRAME_BYTES};
pub use vnc::error::{AllocError, RectError};
pub use vnc::framebuffer::{FrameBuffer, PixelView};
pub use vnc::pixel_format::{Pixel, PixelFormat, PixelWidth};
pub use vnc::rect::{check_rect, Rect};
pub use vnc::sequencer::{spawn_sequencer, SequencerCommand, SequencerEvent, UpdateSequencer};
