//! Scripted connector and in-memory frame stream for transport tests.
//!
//! [`ScriptedConnector`] plays back a queue of connect outcomes and records
//! when each attempt started and how many were in flight at once.
//! [`MockFrameStream`] is fed by its [`MockStreamHandle`], so a test can push
//! frames, inject socket errors, or end the stream from the outside.

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::{Connector, FrameStream, InboundFrame, TransportError};

// ── Frame stream ──────────────────────────────────────────────────────────────

enum Scripted {
    Frame(InboundFrame),
    Error(String),
    End,
}

/// In-memory [`FrameStream`].
pub struct MockFrameStream {
    inbound: mpsc::UnboundedReceiver<Scripted>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

/// Test-side control of a [`MockFrameStream`].
#[derive(Clone)]
pub struct MockStreamHandle {
    inbound: mpsc::UnboundedSender<Scripted>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

/// Creates a connected stream / handle pair.
pub fn mock_stream() -> (MockFrameStream, MockStreamHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sent = Arc::new(Mutex::new(Vec::new()));
    let closed = Arc::new(AtomicBool::new(false));
    (
        MockFrameStream {
            inbound: rx,
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        },
        MockStreamHandle {
            inbound: tx,
            sent,
            closed,
        },
    )
}

impl MockStreamHandle {
    pub fn push_text(&self, text: impl Into<String>) {
        self.push(InboundFrame::Text(text.into()));
    }

    pub fn push(&self, frame: InboundFrame) {
        let _ = self.inbound.send(Scripted::Frame(frame));
    }

    /// Makes the next read fail with an I/O error.
    pub fn fail(&self, reason: impl Into<String>) {
        let _ = self.inbound.send(Scripted::Error(reason.into()));
    }

    /// Ends the stream as if the peer had gone away cleanly.
    pub fn end(&self) {
        let _ = self.inbound.send(Scripted::End);
    }

    /// Text frames the transport sent, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameStream for MockFrameStream {
    async fn next_frame(&mut self) -> Option<Result<InboundFrame, TransportError>> {
        match self.inbound.recv().await {
            Some(Scripted::Frame(f)) => Some(Ok(f)),
            Some(Scripted::Error(reason)) => Some(Err(TransportError::Io(reason))),
            Some(Scripted::End) | None => None,
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Send("stream closed".into()));
        }
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(text);
        Ok(())
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// ── Connector ─────────────────────────────────────────────────────────────────

/// One scripted outcome of [`Connector::connect`].
pub enum ScriptedAttempt {
    Fail(String),
    Open(MockFrameStream),
    /// Succeeds only after the given delay.
    OpenAfter(Duration, MockFrameStream),
    /// Never completes; models a connect stuck in the TCP handshake.
    Hang,
}

/// [`Connector`] that plays back [`ScriptedAttempt`]s in order.
///
/// Once the script is exhausted every further attempt hangs.
#[derive(Default)]
pub struct ScriptedConnector {
    script: Mutex<VecDeque<ScriptedAttempt>>,
    attempt_times: Mutex<Vec<Instant>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedConnector {
    pub fn new(script: impl IntoIterator<Item = ScriptedAttempt>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        })
    }

    /// Appends more outcomes to the script.
    pub fn push(&self, attempt: ScriptedAttempt) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(attempt);
    }

    pub fn attempts(&self) -> usize {
        self.attempt_times().len()
    }

    /// Start time of every connect attempt (Tokio clock, so paused-time
    /// tests see exact values).
    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempt_times
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Largest number of attempts that were ever running concurrently.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the attempt is cancelled.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameStream>, TransportError> {
        self.attempt_times
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Instant::now());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(ScriptedAttempt::Fail(reason)) => Err(TransportError::Connect {
                url: url.to_string(),
                reason,
            }),
            Some(ScriptedAttempt::Open(stream)) => Ok(Box::new(stream)),
            Some(ScriptedAttempt::OpenAfter(delay, stream)) => {
                tokio::time::sleep(delay).await;
                Ok(Box::new(stream))
            }
            Some(ScriptedAttempt::Hang) | None => std::future::pending().await,
        }
    }
}
