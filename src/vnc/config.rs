//! Compositor configuration.

/// Default upper bound on a frame store: 1 GiB.
///
/// A 16-bit geometry at 32bpp can request up to ~16 GiB, well past anything a
/// viewer should honour.
pub const DEFAULT_MAX_FRAME_BYTES: u64 = 1 << 30;

/// Tunables for framebuffer allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositorConfig {
    /// Allocations whose byte count meets or exceeds this value are refused.
    ///
    /// Compared against the 64-bit size before it is narrowed to `usize`, so the
    /// limit behaves the same on 32- and 64-bit hosts.
    pub max_frame_bytes: u64,
}

impl CompositorConfig {
    /// Returns a copy with a different frame size limit.
    pub fn with_max_frame_bytes(mut self, max_frame_bytes: u64) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}
