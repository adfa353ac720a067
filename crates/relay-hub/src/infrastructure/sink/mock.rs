//! Recording frame sink for unit and integration tests.
//!
//! Captures every frame the hub queues so tests can assert on delivery
//! without opening sockets.  A sink can be told to fail its sends to model a
//! client that has fallen behind or disconnected.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;

use super::{FrameSink, SendError};

/// A [`FrameSink`] that records frames in memory.
#[derive(Default)]
pub struct RecordingSink {
    frames: Mutex<Vec<String>>,
    fail_with: Mutex<Option<SendError>>,
    closed: AtomicBool,
    sent_after_close: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A sink whose every `try_send` fails with `error`.
    pub fn failing(error: SendError) -> Arc<Self> {
        let sink = Self::new();
        sink.set_failure(Some(error));
        sink
    }

    /// Makes subsequent sends fail (or succeed again with `None`).
    pub fn set_failure(&self, error: Option<SendError>) {
        *self.fail_with.lock().unwrap_or_else(|e| e.into_inner()) = error;
    }

    /// All frames accepted so far, in order.
    pub fn frames(&self) -> Vec<String> {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of sends attempted after [`FrameSink::close`] completed.
    pub fn sent_after_close(&self) -> usize {
        self.sent_after_close.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameSink for RecordingSink {
    fn try_send(&self, frame: Arc<str>) -> Result<(), SendError> {
        if self.is_closed() {
            self.sent_after_close.fetch_add(1, Ordering::SeqCst);
            return Err(SendError::Closed);
        }
        if let Some(err) = *self.fail_with.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(err);
        }
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(frame.to_string());
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
