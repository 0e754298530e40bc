//! Error types for framebuffer allocation and rectangle operations.
//!
//! Failures come in two severities. [`AllocError`] means the framebuffer no
//! longer exists and the session must be torn down. [`RectError`] only drops
//! the offending update rectangle; the buffer is left untouched and later
//! rectangles are processed normally.

use thiserror::Error;

use super::rect::Rect;

/// Fatal-to-session allocation failure.
///
/// Whenever one of these is returned the previous store has already been
/// released, so the framebuffer is in the unallocated state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The computed frame size meets or exceeds the configured maximum.
    #[error("frame buffer of {requested} bytes meets or exceeds the limit of {limit} bytes")]
    TooLarge { requested: u64, limit: u64 },

    /// The allocator could not provide the requested memory.
    #[error("frame buffer allocation of {requested} bytes failed")]
    Failed { requested: u64 },
}

/// Recoverable per-rectangle failure. No byte of the store was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RectError {
    #[error("no frame buffer is allocated")]
    NoFrameBuffer,

    #[error("rect out of bounds: {rect} in {width}x{height} buffer")]
    OutOfBounds { rect: Rect, width: u16, height: u16 },

    #[error("unsupported bitsPerPixel: {bits_per_pixel}")]
    UnsupportedPixelFormat { bits_per_pixel: u8 },

    /// The external pixel payload does not hold exactly one rectangle's worth of pixels.
    #[error("pixel payload is {actual} bytes, expected {expected}")]
    PayloadLength { expected: usize, actual: usize },
}

impl RectError {
    /// Returns `true` when the caller attempted to write geometry outside the buffer.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, RectError::OutOfBounds { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_message_names_geometry() {
        let err = RectError::OutOfBounds {
            rect: Rect::new(5, 6, 7, 8),
            width: 10,
            height: 10,
        };
        assert_eq!(err.to_string(), "rect out of bounds: 7x8 at (5, 6) in 10x10 buffer");
        assert!(err.is_out_of_bounds());
        assert!(!RectError::NoFrameBuffer.is_out_of_bounds());
    }

    #[test]
    fn too_large_message() {
        let err = AllocError::TooLarge { requested: 20, limit: 10 };
        assert_eq!(
            err.to_string(),
            "frame buffer of 20 bytes meets or exceeds the limit of 10 bytes"
        );
    }
}
