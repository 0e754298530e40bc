//! Framebuffer store ownership and addressing.
//!
//! [`FrameBuffer`] owns the flat pixel store mirroring the remote screen and
//! is the only place that sizes, allocates or releases it. Pixel routines
//! never see the raw store: they borrow a [`PixelView`], which carries the
//! width, height and row stride needed to address and validate every access.

use log::{debug, error, info};

use super::config::CompositorConfig;
use super::error::AllocError;
use super::pixel_format::{Pixel, PixelFormat, PixelWidth};
use super::rect::{check_rect, Rect};

/// Local copy of the remote screen.
///
/// Either unallocated, or holding a store of exactly
/// `width * height * bits_per_pixel / 8` bytes for the current geometry and
/// format. The store is never resized in place.
#[derive(Debug)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    format: PixelFormat,
    config: CompositorConfig,
    store: Option<Vec<u8>>,
}

impl FrameBuffer {
    /// Creates an unallocated framebuffer.
    pub fn new(config: CompositorConfig) -> Self {
        Self {
            width: 0,
            height: 0,
            format: PixelFormat::default(),
            config,
            store: None,
        }
    }

    /// Computes the store size for a geometry and format.
    ///
    /// The width is widened to 64 bits before multiplying, so the result is
    /// exact for every 16-bit geometry.
    pub fn required_bytes(width: u16, height: u16, format: &PixelFormat) -> u64 {
        u64::from(width) * u64::from(height) * u64::from(format.bits_per_pixel) / 8
    }

    /// (Re)allocates the store for a new geometry and format.
    ///
    /// Any existing store is released first, unconditionally. On error the
    /// framebuffer is left unallocated; it is never left holding the old
    /// contents.
    ///
    /// # Arguments
    ///
    /// * `width` - Remote framebuffer width in pixels.
    /// * `height` - Remote framebuffer height in pixels.
    /// * `format` - Negotiated pixel format.
    ///
    /// # Returns
    ///
    /// `Ok(())` once a zeroed store of the exact size exists, otherwise an
    /// [`AllocError`] that the caller must treat as fatal to the session.
    pub fn allocate(&mut self, width: u16, height: u16, format: PixelFormat) -> Result<(), AllocError> {
        self.release();

        self.width = width;
        self.height = height;
        self.format = format;

        let requested = Self::required_bytes(width, height, &format);
        let limit = self.config.max_frame_bytes;

        if requested >= limit {
            error!(
                "CRITICAL: cannot allocate frame buffer, requested size {} is too large (limit {})",
                requested, limit
            );
            return Err(AllocError::TooLarge { requested, limit });
        }

        let len = match usize::try_from(requested) {
            Ok(len) => len,
            Err(_) => {
                error!(
                    "CRITICAL: cannot allocate frame buffer, {} bytes exceeds the address space",
                    requested
                );
                return Err(AllocError::TooLarge { requested, limit });
            }
        };

        let mut store = Vec::new();
        if store.try_reserve_exact(len).is_err() {
            error!(
                "CRITICAL: frame buffer allocation of {} bytes failed, not enough memory?",
                requested
            );
            return Err(AllocError::Failed { requested });
        }
        store.resize(len, 0);
        self.store = Some(store);

        info!(
            "Allocated {}x{} frame buffer at {} bpp ({} bytes)",
            width, height, format.bits_per_pixel, len
        );
        Ok(())
    }

    /// Frees the store, leaving the framebuffer unallocated.
    pub fn release(&mut self) {
        if self.store.take().is_some() {
            debug!("Released {}x{} frame buffer", self.width, self.height);
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.store.is_some()
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    /// The raw store, `None` while unallocated.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.store.as_deref()
    }

    /// Mutable addressable view over the store, `None` while unallocated.
    pub fn view_mut(&mut self) -> Option<PixelView<'_>> {
        let bytes_per_pixel = self.format.bytes_per_pixel();
        let (width, height) = (self.width, self.height);
        self.store
            .as_deref_mut()
            .and_then(|bytes| PixelView::new(bytes, width, height, bytes_per_pixel))
    }

    /// Reads one pixel as a colour value.
    ///
    /// Returns `None` when unallocated, out of bounds, or the format width is
    /// unsupported.
    pub fn pixel(&self, x: u16, y: u16) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let store = self.store.as_deref()?;
        let width = self.format.pixel_width().ok()?;
        let offset = (y as usize * self.width as usize + x as usize) * width.bytes();
        let bytes = store.get(offset..offset + width.bytes())?;

        Some(match width {
            PixelWidth::Bits8 => u8::read(bytes).to_colour(),
            PixelWidth::Bits16 => u16::read(bytes).to_colour(),
            PixelWidth::Bits32 => u32::read(bytes).to_colour(),
        })
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(CompositorConfig::default())
    }
}

/// A mutable view over a framebuffer store with its geometry attached.
///
/// Pixel coordinates passed to [`PixelView::get`] and [`PixelView::set`] must
/// already be validated with [`PixelView::contains`]; slice indexing still
/// guards the store itself.
#[derive(Debug)]
pub struct PixelView<'a> {
    bytes: &'a mut [u8],
    width: u16,
    height: u16,
    bytes_per_pixel: usize,
    stride: usize,
}

impl<'a> PixelView<'a> {
    /// Wraps `bytes` as a `width` x `height` image.
    ///
    /// Returns `None` if the slice length does not match the geometry.
    pub fn new(bytes: &'a mut [u8], width: u16, height: u16, bytes_per_pixel: usize) -> Option<Self> {
        let stride = width as usize * bytes_per_pixel;
        if bytes.len() != stride * height as usize {
            return None;
        }
        Some(Self {
            bytes,
            width,
            height,
            bytes_per_pixel,
            stride,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// Row stride in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns `true` if `rect` lies fully inside the view.
    pub fn contains(&self, rect: &Rect) -> bool {
        check_rect(self.width, self.height, rect)
    }

    /// Byte offset of pixel `(x, y)`.
    pub fn offset(&self, x: usize, y: usize) -> usize {
        y * self.stride + x * self.bytes_per_pixel
    }

    pub fn get<P: Pixel>(&self, x: usize, y: usize) -> P {
        debug_assert_eq!(P::BYTES, self.bytes_per_pixel);
        let offset = self.offset(x, y);
        P::read(&self.bytes[offset..offset + P::BYTES])
    }

    pub fn set<P: Pixel>(&mut self, x: usize, y: usize, value: P) {
        debug_assert_eq!(P::BYTES, self.bytes_per_pixel);
        let offset = self.offset(x, y);
        value.write(&mut self.bytes[offset..offset + P::BYTES]);
    }

    /// The bytes of row `y` spanning `len` pixels from column `x`.
    pub fn row_mut(&mut self, x: usize, y: usize, len: usize) -> &mut [u8] {
        let start = self.offset(x, y);
        &mut self.bytes[start..start + len * self.bytes_per_pixel]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(bits_per_pixel: u8) -> PixelFormat {
        PixelFormat {
            bits_per_pixel,
            ..PixelFormat::default()
        }
    }

    #[test]
    fn allocates_exact_size_for_each_width() {
        let mut fb = FrameBuffer::default();
        for bpp in [8u8, 16, 32] {
            fb.allocate(640, 480, format(bpp)).unwrap();
            assert_eq!(fb.as_bytes().unwrap().len(), 640 * 480 * bpp as usize / 8);
            assert_eq!((fb.width(), fb.height()), (640, 480));
        }
    }

    #[test]
    fn size_is_computed_in_64_bits() {
        assert_eq!(
            FrameBuffer::required_bytes(u16::MAX, u16::MAX, &format(32)),
            65535u64 * 65535 * 4
        );
    }

    #[test]
    fn too_large_leaves_buffer_unallocated() {
        let config = CompositorConfig::default().with_max_frame_bytes(100 * 100 * 4);
        let mut fb = FrameBuffer::new(config);
        fb.allocate(10, 10, format(32)).unwrap();
        assert!(fb.is_allocated());

        let err = fb.allocate(100, 100, format(32)).unwrap_err();
        assert_eq!(
            err,
            AllocError::TooLarge {
                requested: 40_000,
                limit: 40_000
            }
        );
        assert!(!fb.is_allocated());
        assert!(fb.as_bytes().is_none());
        assert!(fb.view_mut().is_none());
    }

    // AllocError::Failed comes from `try_reserve_exact` refusing memory. There
    // is no allocator hook to force that, so the path is not exercised here.

    #[test]
    fn full_protocol_geometry_is_refused_by_default() {
        let mut fb = FrameBuffer::default();
        let err = fb.allocate(u16::MAX, u16::MAX, format(32)).unwrap_err();
        assert!(matches!(err, AllocError::TooLarge { .. }));
        assert!(!fb.is_allocated());
    }

    #[test]
    fn release_drops_store() {
        let mut fb = FrameBuffer::default();
        fb.allocate(4, 4, format(8)).unwrap();
        fb.release();
        assert!(!fb.is_allocated());
        assert_eq!(fb.pixel(0, 0), None);
    }

    #[test]
    fn view_addresses_with_stride() {
        let mut fb = FrameBuffer::default();
        fb.allocate(3, 2, format(16)).unwrap();
        {
            let mut view = fb.view_mut().unwrap();
            assert_eq!(view.bytes_per_pixel(), 2);
            assert_eq!(view.stride(), 6);
            assert_eq!(view.offset(2, 1), 10);
            view.set(2, 1, 0xABCDu16);
            assert_eq!(view.get::<u16>(2, 1), 0xABCD);
            assert!(view.contains(&Rect::new(0, 0, 3, 2)));
            assert!(!view.contains(&Rect::new(1, 0, 3, 2)));
        }
        assert_eq!(fb.pixel(2, 1), Some(0xABCD));
        assert_eq!(fb.pixel(3, 1), None);
    }

    #[test]
    fn view_rejects_mismatched_store() {
        let mut bytes = [0u8; 5];
        assert!(PixelView::new(&mut bytes, 2, 2, 1).is_none());
    }
}
