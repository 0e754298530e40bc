//! Update rectangle geometry and bounds checking.

use std::fmt;

/// An axis-aligned update rectangle as declared by the server.
///
/// Fields are signed so that hostile or corrupt geometry can be represented
/// and rejected by [`check_rect`] instead of wrapping on conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// Creates a rectangle from origin and size.
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Returns `true` if the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Number of pixels covered, zero for degenerate rectangles.
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.w as u64 * self.h as u64
        }
    }

    /// Smallest rectangle covering both `self` and `other`.
    ///
    /// Empty rectangles do not contribute to the union.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = (self.x as i64 + self.w as i64).max(other.x as i64 + other.w as i64);
        let bottom = (self.y as i64 + self.h as i64).max(other.y as i64 + other.h as i64);

        Rect::new(left, top, (right - left as i64) as i32, (bottom - top as i64) as i32)
    }

    /// Bounding box of a set of rectangles, `None` if every rectangle is empty.
    pub fn bounding(rects: &[Rect]) -> Option<Rect> {
        let merged = rects
            .iter()
            .fold(Rect::default(), |acc, rect| acc.union(rect));
        if merged.is_empty() {
            None
        } else {
            Some(merged)
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} at ({}, {})", self.w, self.h, self.x, self.y)
    }
}

/// Checks that `rect` lies fully within a `width` x `height` buffer.
///
/// Negative origins and negative sizes are rejected. Edge sums are computed
/// in 64 bits so geometry near `i32::MAX` cannot wrap into range.
pub fn check_rect(width: u16, height: u16, rect: &Rect) -> bool {
    if rect.x < 0 || rect.y < 0 || rect.w < 0 || rect.h < 0 {
        return false;
    }

    rect.x as i64 + rect.w as i64 <= width as i64 && rect.y as i64 + rect.h as i64 <= height as i64
}
