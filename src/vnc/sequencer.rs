//! Update sequencer: feeds decoded updates to an [`UpdateSink`] one at a time.
//!
//! The sequencer is the single owner of its sink. It runs as a tokio task,
//! receiving [`SequencerCommand`]s from the protocol layer and reporting
//! [`SequencerEvent`]s to the presentation layer. Because every command is
//! applied to completion before the next is received, reallocation can only
//! ever happen between batches.

use log::{debug, error, info, warn};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use super::compositor::{BatchSummary, UpdateDirective, UpdateSink};
use super::error::AllocError;
use super::pixel_format::PixelFormat;

/// Work for the sequencer, produced by the protocol layer.
#[derive(Debug, Clone)]
pub enum SequencerCommand {
    /// Remote geometry or pixel format changed; recreate the store.
    Resize {
        width: u16,
        height: u16,
        format: PixelFormat,
    },
    /// One framebuffer update, applied in order.
    Batch(Vec<UpdateDirective>),
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerEvent {
    Resized { width: u16, height: u16 },
    BatchComplete(BatchSummary),
    /// The store could not be allocated. The session is unusable.
    SessionFailed(AllocError),
}

/// Applies commands to an owned sink.
#[derive(Debug)]
pub struct UpdateSequencer<S> {
    sink: S,
}

impl<S: UpdateSink> UpdateSequencer<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Applies one command and returns the resulting event.
    ///
    /// Rectangles rejected with a recoverable error are skipped and counted in
    /// the batch summary; the remaining rectangles are still applied.
    pub fn handle(&mut self, command: SequencerCommand) -> SequencerEvent {
        match command {
            SequencerCommand::Resize { width, height, format } => {
                match self.sink.allocate(width, height, format) {
                    Ok(()) => SequencerEvent::Resized { width, height },
                    Err(e) => {
                        error!("Frame buffer allocation failed: {}", e);
                        SequencerEvent::SessionFailed(e)
                    }
                }
            }
            SequencerCommand::Batch(directives) => {
                for directive in &directives {
                    if let Err(e) = directive.apply(&mut self.sink) {
                        warn!("Dropped update rectangle: {}", e);
                    }
                }
                SequencerEvent::BatchComplete(self.sink.finish_batch())
            }
        }
    }
}

/// Spawns the sequencer as a tokio task.
///
/// The task stops when the command channel closes, when `shutdown` fires, or
/// after reporting [`SequencerEvent::SessionFailed`]. Dropping the shutdown
/// sender without sending does not stop the task; queued commands are still
/// applied. The sink's store is released on exit and the sink is handed back
/// through the join handle.
///
/// # Arguments
///
/// * `sink` - The sink to own for the lifetime of the task.
/// * `commands` - Receiver of commands from the protocol layer.
/// * `shutdown` - Broadcast receiver for session teardown.
///
/// # Returns
///
/// The task's join handle and the receiving end of the event channel.
pub fn spawn_sequencer<S>(
    sink: S,
    mut commands: mpsc::UnboundedReceiver<SequencerCommand>,
    mut shutdown: broadcast::Receiver<()>,
) -> (JoinHandle<S>, mpsc::UnboundedReceiver<SequencerEvent>)
where
    S: UpdateSink + Send + 'static,
{
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let mut sequencer = UpdateSequencer::new(sink);

    let handle = tokio::spawn(async move {
        info!("Update sequencer started");
        let mut shutdown_closed = false;

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        info!("Update command channel closed");
                        break;
                    };

                    let event = sequencer.handle(command);
                    let fatal = matches!(event, SequencerEvent::SessionFailed(_));
                    if event_tx.send(event).is_err() {
                        warn!("Update event receiver dropped");
                    }
                    if fatal {
                        break;
                    }
                }
                signal = shutdown.recv(), if !shutdown_closed => {
                    match signal {
                        Ok(()) | Err(RecvError::Lagged(_)) => {
                            info!("Update sequencer received shutdown signal");
                            break;
                        }
                        Err(RecvError::Closed) => {
                            debug!("Shutdown sender dropped, sequencer runs until the command channel closes");
                            shutdown_closed = true;
                        }
                    }
                }
            }
        }

        let mut sink = sequencer.into_sink();
        sink.release();
        info!("Update sequencer stopped");
        sink
    });

    (handle, event_rx)
}
