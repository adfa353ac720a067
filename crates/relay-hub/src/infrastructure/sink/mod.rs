//! Outbound frame sinks: the socket abstraction the broadcast hub writes to.
//!
//! The hub never touches a WebSocket directly.  Each session is represented
//! by a [`FrameSink`] whose `try_send` must not block: the hub calls it while
//! holding its session-set lock.
//!
//! The production sink, [`ChannelSink`], pushes frames into a small bounded
//! queue that a per-connection writer task drains into the socket:
//!
//! ```text
//! BroadcastHub ──try_send──► [ bounded mpsc ] ──► OutboundQueue ──► ws sink
//!                                                     ▲
//!                                close() ── gate ─────┘
//! ```
//!
//! The *gate* is what lets `unregister` promise that nothing reaches the
//! socket after it returns.  The writer holds the gate while writing a frame;
//! `close()` waits for the gate and flips it shut.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard};

pub mod mock;

/// Why a frame could not be queued for a session.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The session's outbound buffer is full; it is not keeping up.
    #[error("outbound queue full")]
    Full,

    /// The session's writer has gone away.
    #[error("session closed")]
    Closed,
}

/// Per-session outbound port used by the broadcast hub.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Queues a text frame without blocking.
    fn try_send(&self, frame: Arc<str>) -> Result<(), SendError>;

    /// Permanently stops delivery.  When this returns, no further frame
    /// (including ones already queued) will be written.
    async fn close(&self);
}

// ── Channel-backed sink ───────────────────────────────────────────────────────

/// [`FrameSink`] backed by a bounded `tokio::sync::mpsc` queue.
pub struct ChannelSink {
    tx: mpsc::Sender<Arc<str>>,
    gate: Arc<Mutex<bool>>,
}

/// Receiving half of a [`ChannelSink`], owned by the connection writer task.
pub struct OutboundQueue {
    rx: mpsc::Receiver<Arc<str>>,
    gate: Arc<Mutex<bool>>,
}

/// A frame the writer is allowed to put on the socket.
///
/// Holding the permit keeps the gate locked; drop it once the write is done.
pub struct WritePermit {
    pub frame: Arc<str>,
    _gate: OwnedMutexGuard<bool>,
}

impl ChannelSink {
    /// Creates a sink and its queue with room for `capacity` frames.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> (Self, OutboundQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let gate = Arc::new(Mutex::new(true));
        (
            Self {
                tx,
                gate: Arc::clone(&gate),
            },
            OutboundQueue { rx, gate },
        )
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    fn try_send(&self, frame: Arc<str>) -> Result<(), SendError> {
        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }

    async fn close(&self) {
        *self.gate.lock().await = false;
    }
}

impl OutboundQueue {
    /// Waits for the next frame and locks the gate for writing it.
    ///
    /// Returns `None` once the sink has been closed or dropped; the writer
    /// should then shut the socket down.
    pub async fn next_permit(&mut self) -> Option<WritePermit> {
        let frame = self.rx.recv().await?;
        let guard = Arc::clone(&self.gate).lock_owned().await;
        if !*guard {
            self.rx.close();
            return None;
        }
        Some(WritePermit {
            frame,
            _gate: guard,
        })
    }
}
