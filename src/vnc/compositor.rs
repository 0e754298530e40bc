//! Update sinks: where decoded update rectangles are applied.
//!
//! The protocol layer talks to an [`UpdateSink`]. Two implementations exist
//! and one is picked when the session is built:
//!
//! - [`Compositor`]: owns the [`FrameBuffer`] and applies every rectangle.
//! - [`NullCompositor`]: accepts and discards everything, for sessions that
//!   keep no local screen copy.

use bytes::Bytes;
use log::debug;

use super::blit;
use super::config::CompositorConfig;
use super::error::{AllocError, RectError};
use super::framebuffer::FrameBuffer;
use super::pixel_format::PixelFormat;
use super::rect::Rect;

/// One decoded update rectangle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDirective {
    /// Solid colour fill.
    Fill { rect: Rect, colour: u32 },
    /// Raw pixels, tightly packed and row-major, in the buffer's format.
    Bitmap { rect: Rect, pixels: Bytes },
    /// Prior content of `src` moved to `(dst_x, dst_y)`.
    CopyRect { src: Rect, dst_x: i32, dst_y: i32 },
}

impl UpdateDirective {
    /// The region this directive writes.
    pub fn target(&self) -> Rect {
        match self {
            UpdateDirective::Fill { rect, .. } | UpdateDirective::Bitmap { rect, .. } => *rect,
            UpdateDirective::CopyRect { src, dst_x, dst_y } => Rect::new(*dst_x, *dst_y, src.w, src.h),
        }
    }

    /// Applies the directive to `sink`.
    pub fn apply<S: UpdateSink + ?Sized>(&self, sink: &mut S) -> Result<(), RectError> {
        match self {
            UpdateDirective::Fill { rect, colour } => sink.fill_rect(rect, *colour),
            UpdateDirective::Bitmap { rect, pixels } => sink.copy_external(pixels, rect),
            UpdateDirective::CopyRect { src, dst_x, dst_y } => sink.copy_in_place(src, *dst_x, *dst_y),
        }
    }
}

/// Outcome of one framebuffer update batch, handed to the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Rectangles written to the store.
    pub applied: usize,
    /// Rectangles dropped with a recoverable error.
    pub dropped: usize,
    /// Bounding box of every written rectangle, `None` if nothing changed.
    pub damage: Option<Rect>,
}

/// Receiver of framebuffer allocation and per-rectangle updates.
///
/// Calls are strictly sequential: the caller issues one operation and waits
/// for it to return before the next. `allocate` must only be called between
/// batches.
pub trait UpdateSink {
    /// Replaces the store for a new geometry and format.
    fn allocate(&mut self, width: u16, height: u16, format: PixelFormat) -> Result<(), AllocError>;

    fn fill_rect(&mut self, rect: &Rect, colour: u32) -> Result<(), RectError>;

    fn copy_external(&mut self, pixels: &[u8], rect: &Rect) -> Result<(), RectError>;

    fn copy_in_place(&mut self, src: &Rect, dst_x: i32, dst_y: i32) -> Result<(), RectError>;

    /// Marks the end of an update batch and returns what changed in it.
    fn finish_batch(&mut self) -> BatchSummary;

    /// Frees the store at session teardown.
    fn release(&mut self);
}

/// The active sink: applies every update to an owned [`FrameBuffer`].
#[derive(Debug, Default)]
pub struct Compositor {
    framebuffer: FrameBuffer,
    damage: Vec<Rect>,
    applied: usize,
    dropped: usize,
}

impl Compositor {
    pub fn new(config: CompositorConfig) -> Self {
        Self {
            framebuffer: FrameBuffer::new(config),
            damage: Vec::new(),
            applied: 0,
            dropped: 0,
        }
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// Rectangles written since the last [`UpdateSink::finish_batch`].
    pub fn pending_damage(&self) -> &[Rect] {
        &self.damage
    }

    fn reset_batch(&mut self) {
        self.damage.clear();
        self.applied = 0;
        self.dropped = 0;
    }

    fn record(&mut self, target: Rect, result: Result<(), RectError>) -> Result<(), RectError> {
        match result {
            Ok(()) => {
                self.applied += 1;
                if !target.is_empty() {
                    self.damage.push(target);
                }
            }
            Err(_) => self.dropped += 1,
        }
        result
    }
}

impl UpdateSink for Compositor {
    fn allocate(&mut self, width: u16, height: u16, format: PixelFormat) -> Result<(), AllocError> {
        self.reset_batch();
        self.framebuffer.allocate(width, height, format)
    }

    fn fill_rect(&mut self, rect: &Rect, colour: u32) -> Result<(), RectError> {
        let result = blit::fill_rect(&mut self.framebuffer, rect, colour);
        self.record(*rect, result)
    }

    fn copy_external(&mut self, pixels: &[u8], rect: &Rect) -> Result<(), RectError> {
        let result = blit::copy_external(&mut self.framebuffer, pixels, rect);
        self.record(*rect, result)
    }

    fn copy_in_place(&mut self, src: &Rect, dst_x: i32, dst_y: i32) -> Result<(), RectError> {
        let result = blit::copy_in_place(&mut self.framebuffer, src, dst_x, dst_y);
        self.record(Rect::new(dst_x, dst_y, src.w, src.h), result)
    }

    fn finish_batch(&mut self) -> BatchSummary {
        let summary = BatchSummary {
            applied: self.applied,
            dropped: self.dropped,
            damage: Rect::bounding(&self.damage),
        };
        debug!(
            "Update batch complete: {} applied, {} dropped, damage {:?}",
            summary.applied, summary.dropped, summary.damage
        );

        self.reset_batch();
        summary
    }

    fn release(&mut self) {
        self.reset_batch();
        self.framebuffer.release();
    }
}

/// The stub sink: accepts every call and touches nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCompositor;

impl UpdateSink for NullCompositor {
    fn allocate(&mut self, _width: u16, _height: u16, _format: PixelFormat) -> Result<(), AllocError> {
        Ok(())
    }

    fn fill_rect(&mut self, _rect: &Rect, _colour: u32) -> Result<(), RectError> {
        Ok(())
    }

    fn copy_external(&mut self, _pixels: &[u8], _rect: &Rect) -> Result<(), RectError> {
        Ok(())
    }

    fn copy_in_place(&mut self, _src: &Rect, _dst_x: i32, _dst_y: i32) -> Result<(), RectError> {
        Ok(())
    }

    fn finish_batch(&mut self) -> BatchSummary {
        BatchSummary::default()
    }

    fn release(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compositor(width: u16, height: u16) -> Compositor {
        let mut compositor = Compositor::default();
        compositor
            .allocate(width, height, PixelFormat::client_default(8, 1, 1))
            .unwrap();
        compositor
    }

    #[test]
    fn directives_dispatch_to_matching_operation() {
        let mut sink = compositor(4, 2);
        let directives = [
            UpdateDirective::Fill {
                rect: Rect::new(0, 0, 2, 1),
                colour: 9,
            },
            UpdateDirective::Bitmap {
                rect: Rect::new(2, 0, 2, 1),
                pixels: Bytes::from_static(&[1, 2]),
            },
            UpdateDirective::CopyRect {
                src: Rect::new(0, 0, 4, 1),
                dst_x: 0,
                dst_y: 1,
            },
        ];
        for directive in &directives {
            directive.apply(&mut sink).unwrap();
        }

        assert_eq!(sink.framebuffer().as_bytes().unwrap(), &[9, 9, 1, 2, 9, 9, 1, 2]);
        assert_eq!(directives[2].target(), Rect::new(0, 1, 4, 1));
    }

    #[test]
    fn batch_summary_tracks_damage_and_drops() {
        let mut sink = compositor(8, 8);
        sink.fill_rect(&Rect::new(1, 1, 2, 2), 1).unwrap();
        sink.copy_in_place(&Rect::new(1, 1, 2, 2), 5, 4).unwrap();
        assert!(sink.fill_rect(&Rect::new(7, 7, 2, 2), 1).is_err());
        sink.fill_rect(&Rect::new(0, 0, 0, 0), 1).unwrap();
        assert_eq!(sink.pending_damage().len(), 2);

        let summary = sink.finish_batch();
        assert_eq!(
            summary,
            BatchSummary {
                applied: 3,
                dropped: 1,
                damage: Some(Rect::new(1, 1, 6, 5)),
            }
        );
        assert_eq!(sink.finish_batch(), BatchSummary::default());
    }

    #[test]
    fn release_leaves_sink_unallocated() {
        let mut sink = compositor(2, 2);
        sink.release();
        assert!(!sink.framebuffer().is_allocated());
        assert_eq!(sink.fill_rect(&Rect::new(0, 0, 1, 1), 1), Err(RectError::NoFrameBuffer));
    }

    #[test]
    fn release_discards_pending_batch() {
        let mut sink = compositor(2, 2);
        sink.fill_rect(&Rect::new(0, 0, 1, 1), 1).unwrap();
        assert!(sink.fill_rect(&Rect::new(1, 1, 2, 2), 1).is_err());
        sink.release();
        assert_eq!(sink.finish_batch(), BatchSummary::default());
    }

    #[test]
    fn null_compositor_accepts_everything() {
        let mut sink = NullCompositor;
        sink.allocate(u16::MAX, u16::MAX, PixelFormat::default()).unwrap();
        let directive = UpdateDirective::Fill {
            rect: Rect::new(-5, -5, 1, 1),
            colour: 0,
        };
        assert!(directive.apply(&mut sink).is_ok());
        assert_eq!(sink.finish_batch(), BatchSummary::default());
    }
}
