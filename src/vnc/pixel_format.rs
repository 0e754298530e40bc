//! Pixel format description and per-width pixel storage.
//!
//! The compositor supports three storage widths: 8, 16 and 32 bits per pixel.
//! [`PixelWidth`] is resolved once per operation from the negotiated
//! [`PixelFormat`], and each operation then runs a routine generic over the
//! matching [`Pixel`] storage type.

use byteorder::{ByteOrder, NativeEndian};

use super::error::RectError;

/// Pixel layout negotiated with the server.
///
/// Fixed for the lifetime of an allocated framebuffer; changing it requires a
/// fresh allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub bits_per_pixel: u8,
    pub depth: u8,
    pub big_endian: bool,
    pub true_colour: bool,
    pub red_max: u16,
    pub green_max: u16,
    pub blue_max: u16,
    pub red_shift: u8,
    pub green_shift: u8,
    pub blue_shift: u8,
}

impl PixelFormat {
    /// Builds the initial format a viewer requests before negotiation.
    ///
    /// 8bpp uses the BGR233 layout. Wider formats give every channel
    /// `bits_per_sample` bits, ordered red-low on little-endian hosts and
    /// red-high on big-endian hosts.
    ///
    /// # Arguments
    ///
    /// * `bits_per_sample` - Bits per colour channel.
    /// * `samples_per_pixel` - Number of colour channels.
    /// * `bytes_per_pixel` - Storage width of one pixel.
    pub fn client_default(bits_per_sample: u8, samples_per_pixel: u8, bytes_per_pixel: u8) -> Self {
        let bits_per_pixel = bytes_per_pixel.saturating_mul(8);
        let big_endian = cfg!(target_endian = "big");

        let mut format = PixelFormat {
            bits_per_pixel,
            depth: bits_per_sample.saturating_mul(samples_per_pixel),
            big_endian,
            true_colour: true,
            red_max: 0,
            green_max: 0,
            blue_max: 0,
            red_shift: 0,
            green_shift: 0,
            blue_shift: 0,
        };

        if bits_per_pixel == 8 {
            format.red_max = 7;
            format.green_max = 7;
            format.blue_max = 3;
            format.red_shift = 0;
            format.green_shift = 3;
            format.blue_shift = 6;
            return format;
        }

        let channel_max = ((1u32 << bits_per_sample.min(16)) - 1) as u16;
        format.red_max = channel_max;
        format.green_max = channel_max;
        format.blue_max = channel_max;

        let b = bits_per_sample;
        if !big_endian {
            format.red_shift = 0;
            format.green_shift = b;
            format.blue_shift = b.saturating_mul(2);
        } else if bits_per_pixel == 24 {
            format.red_shift = b.saturating_mul(2);
            format.green_shift = b;
            format.blue_shift = 0;
        } else {
            format.red_shift = b.saturating_mul(3);
            format.green_shift = b.saturating_mul(2);
            format.blue_shift = b;
        }

        format
    }

    /// Storage bytes per pixel, rounded down like the wire format.
    pub fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel as usize / 8
    }

    /// Resolves the storage width, failing for anything but 8, 16 or 32 bits.
    pub fn pixel_width(&self) -> Result<PixelWidth, RectError> {
        PixelWidth::from_bits_per_pixel(self.bits_per_pixel)
    }

    /// Packs channel intensities into a pixel value for this format.
    ///
    /// Each channel is masked to its maximum before shifting.
    pub fn pack_rgb(&self, red: u16, green: u16, blue: u16) -> u32 {
        let channel = |value: u16, max: u16, shift: u8| -> u32 {
            u32::from(value & max).checked_shl(u32::from(shift)).unwrap_or(0)
        };

        channel(red, self.red_max, self.red_shift)
            | channel(green, self.green_max, self.green_shift)
            | channel(blue, self.blue_max, self.blue_shift)
    }
}

impl Default for PixelFormat {
    /// 32bpp true colour, 8 bits per channel.
    fn default() -> Self {
        PixelFormat::client_default(8, 3, 4)
    }
}

/// The closed set of supported storage widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelWidth {
    Bits8,
    Bits16,
    Bits32,
}

impl PixelWidth {
    /// Maps a `bitsPerPixel` value onto a storage width.
    pub fn from_bits_per_pixel(bits_per_pixel: u8) -> Result<Self, RectError> {
        match bits_per_pixel {
            8 => Ok(PixelWidth::Bits8),
            16 => Ok(PixelWidth::Bits16),
            32 => Ok(PixelWidth::Bits32),
            _ => Err(RectError::UnsupportedPixelFormat { bits_per_pixel }),
        }
    }

    /// Storage bytes for one pixel of this width.
    pub fn bytes(self) -> usize {
        match self {
            PixelWidth::Bits8 => 1,
            PixelWidth::Bits16 => 2,
            PixelWidth::Bits32 => 4,
        }
    }
}

/// A pixel storage type. Values are stored in host byte order, matching a
/// direct typed write into the store.
pub trait Pixel: Copy + PartialEq + std::fmt::Debug {
    /// Storage bytes per pixel.
    const BYTES: usize;

    /// Narrows a colour value to this width, keeping the low bits.
    fn from_colour(colour: u32) -> Self;

    /// Widens the pixel back to a colour value.
    fn to_colour(self) -> u32;

    /// Reads a pixel from the first `BYTES` bytes of `bytes`.
    fn read(bytes: &[u8]) -> Self;

    /// Writes the pixel into the first `BYTES` bytes of `bytes`.
    fn write(self, bytes: &mut [u8]);
}

impl Pixel for u8 {
    const BYTES: usize = 1;

    fn from_colour(colour: u32) -> Self {
        colour as u8
    }

    fn to_colour(self) -> u32 {
        u32::from(self)
    }

    fn read(bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn write(self, bytes: &mut [u8]) {
        bytes[0] = self;
    }
}

impl Pixel for u16 {
    const BYTES: usize = 2;

    fn from_colour(colour: u32) -> Self {
        colour as u16
    }

    fn to_colour(self) -> u32 {
        u32::from(self)
    }

    fn read(bytes: &[u8]) -> Self {
        NativeEndian::read_u16(bytes)
    }

    fn write(self, bytes: &mut [u8]) {
        NativeEndian::write_u16(bytes, self);
    }
}

impl Pixel for u32 {
    const BYTES: usize = 4;

    fn from_colour(colour: u32) -> Self {
        colour
    }

    fn to_colour(self) -> u32 {
        self
    }

    fn read(bytes: &[u8]) -> Self {
        NativeEndian::read_u32(bytes)
    }

    fn write(self, bytes: &mut [u8]) {
        NativeEndian::write_u32(bytes, self);
    }
}
