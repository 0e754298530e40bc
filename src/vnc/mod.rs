//! Framebuffer compositor for an RFB (VNC) viewer.
//!
//! This module keeps the viewer's local copy of the remote screen and applies
//! decoded update rectangles to it. Network transport, message parsing,
//! authentication and presentation live elsewhere; this code only ever sees
//! geometry, a pixel format, fill colours and already-decoded pixel bytes.
//!
//! # Architecture
//!
//! - **`framebuffer`**: Store sizing, allocation and the bounds-checked pixel view
//! - **`rect`**: Update rectangle geometry and bounds checking
//! - **`pixel_format`**: Pixel format description and 8/16/32 bpp dispatch
//! - **`blit`**: Fill, external copy and overlap-safe in-place copy
//! - **`compositor`**: Active and no-op update sinks, damage tracking
//! - **`sequencer`**: Task that applies update batches in order
//! - **`config`**: Allocation limits
//! - **`error`**: Fatal and recoverable error types
//!
//! # Example Flow
//!
//! ```ignore
//! let (command_tx, command_rx) = mpsc::unbounded_channel();
//! let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//! let (handle, mut events) = spawn_sequencer(Compositor::default(), command_rx, shutdown_rx);
//!
//! command_tx.send(SequencerCommand::Resize { width: 1920, height: 1080, format })?;
//! command_tx.send(SequencerCommand::Batch(directives))?;
//!
//! while let Some(event) = events.recv().await {
//!     // present damage, or tear down on SessionFailed
//! }
//! ```

pub mod blit;
pub mod compositor;
pub mod config;
pub mod error;
pub mod framebuffer;
pub mod pixel_format;
pub mod rect;
pub mod sequencer;
