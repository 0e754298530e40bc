//! Rectangle pixel operations on a [`FrameBuffer`].
//!
//! Each operation validates every rectangle it touches before writing a
//! single byte, then resolves the pixel width once and runs a routine generic
//! over the storage type. A returned [`RectError`] always means the store was
//! left untouched.

use log::{debug, warn};

use super::error::RectError;
use super::framebuffer::{FrameBuffer, PixelView};
use super::pixel_format::{Pixel, PixelFormat, PixelWidth};
use super::rect::{check_rect, Rect};

/// Fills `rect` with `colour`, narrowed to the buffer's pixel width.
pub fn fill_rect(fb: &mut FrameBuffer, rect: &Rect, colour: u32) -> Result<(), RectError> {
    ensure_allocated(fb)?;
    ensure_inside(fb, rect, "Rect")?;
    let width = pixel_width(fb.format())?;
    let mut view = view_of(fb)?;

    match width {
        PixelWidth::Bits8 => fill::<u8>(&mut view, rect, colour),
        PixelWidth::Bits16 => fill::<u16>(&mut view, rect, colour),
        PixelWidth::Bits32 => fill::<u32>(&mut view, rect, colour),
    }
    Ok(())
}

/// Copies a tightly packed, row-major pixel payload into `rect`.
///
/// `pixels` must hold exactly `rect.w * rect.h` pixels. Destination rows are
/// addressed with the framebuffer's own stride, so `rect` may be narrower
/// than the buffer.
pub fn copy_external(fb: &mut FrameBuffer, pixels: &[u8], rect: &Rect) -> Result<(), RectError> {
    ensure_allocated(fb)?;
    ensure_inside(fb, rect, "Rect")?;

    let width = pixel_width(fb.format())?;
    let expected = rect.area() as usize * width.bytes();
    if pixels.len() != expected {
        warn!(
            "Pixel payload for {} is {} bytes, expected {}",
            rect,
            pixels.len(),
            expected
        );
        return Err(RectError::PayloadLength {
            expected,
            actual: pixels.len(),
        });
    }

    let mut view = view_of(fb)?;
    match width {
        PixelWidth::Bits8 => copy_rows::<u8>(&mut view, pixels, rect),
        PixelWidth::Bits16 => copy_rows::<u16>(&mut view, pixels, rect),
        PixelWidth::Bits32 => copy_rows::<u32>(&mut view, pixels, rect),
    }
    Ok(())
}

/// Moves the pixels of `src` to `(dst_x, dst_y)` within the same buffer.
///
/// Source and destination may overlap in any way. Both rectangles are checked
/// before the first write, so a rejected move never leaves a partial copy.
pub fn copy_in_place(fb: &mut FrameBuffer, src: &Rect, dst_x: i32, dst_y: i32) -> Result<(), RectError> {
    ensure_allocated(fb)?;
    let dst = Rect::new(dst_x, dst_y, src.w, src.h);
    ensure_inside(fb, src, "Source rect")?;
    ensure_inside(fb, &dst, "Dest rect")?;
    let width = pixel_width(fb.format())?;
    let mut view = view_of(fb)?;

    match width {
        PixelWidth::Bits8 => move_rect::<u8>(&mut view, src, &dst),
        PixelWidth::Bits16 => move_rect::<u16>(&mut view, src, &dst),
        PixelWidth::Bits32 => move_rect::<u32>(&mut view, src, &dst),
    }
    Ok(())
}

fn ensure_allocated(fb: &FrameBuffer) -> Result<(), RectError> {
    if fb.is_allocated() {
        return Ok(());
    }
    debug!("Dropping rect update, no frame buffer allocated");
    Err(RectError::NoFrameBuffer)
}

// Only called once the pixel width is known to be supported, so the store
// length always matches the view geometry.
fn view_of(fb: &mut FrameBuffer) -> Result<PixelView<'_>, RectError> {
    fb.view_mut().ok_or(RectError::NoFrameBuffer)
}

fn ensure_inside(fb: &FrameBuffer, rect: &Rect, what: &str) -> Result<(), RectError> {
    if check_rect(fb.width(), fb.height(), rect) {
        return Ok(());
    }
    warn!("{} out of bounds: {}", what, rect);
    Err(RectError::OutOfBounds {
        rect: *rect,
        width: fb.width(),
        height: fb.height(),
    })
}

fn pixel_width(format: &PixelFormat) -> Result<PixelWidth, RectError> {
    format.pixel_width().map_err(|e| {
        warn!("Unsupported bitsPerPixel: {}", format.bits_per_pixel);
        e
    })
}

fn fill<P: Pixel>(view: &mut PixelView<'_>, rect: &Rect, colour: u32) {
    let value = P::from_colour(colour);
    let (x, y) = (rect.x as usize, rect.y as usize);
    let (w, h) = (rect.w as usize, rect.h as usize);

    for row in y..y + h {
        for pixel in view.row_mut(x, row, w).chunks_exact_mut(P::BYTES) {
            value.write(pixel);
        }
    }
}

fn copy_rows<P: Pixel>(view: &mut PixelView<'_>, pixels: &[u8], rect: &Rect) {
    let (x, y) = (rect.x as usize, rect.y as usize);
    let (w, h) = (rect.w as usize, rect.h as usize);
    let row_bytes = w * P::BYTES;
    if row_bytes == 0 {
        return;
    }

    for (row, src) in pixels.chunks_exact(row_bytes).take(h).enumerate() {
        view.row_mut(x, y + row, w).copy_from_slice(src);
    }
}

/// Overlap-safe rectangle move.
///
/// Rows run top-to-bottom when moving up and bottom-to-top otherwise; columns
/// run left-to-right when moving left and right-to-left otherwise. With that
/// order every source pixel is read before this move can overwrite it.
fn move_rect<P: Pixel>(view: &mut PixelView<'_>, src: &Rect, dst: &Rect) {
    let (w, h) = (src.w as usize, src.h as usize);
    let (src_x, src_y) = (src.x as usize, src.y as usize);
    let (dst_x, dst_y) = (dst.x as usize, dst.y as usize);

    let top_down = dst.y < src.y;
    let left_to_right = dst.x < src.x;

    for step in 0..h {
        let row = if top_down { step } else { h - 1 - step };
        for col_step in 0..w {
            let col = if left_to_right { col_step } else { w - 1 - col_step };
            let value: P = view.get(src_x + col, src_y + row);
            view.set(dst_x + col, dst_y + row, value);
        }
    }
}
