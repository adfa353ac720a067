//! Receiver-side transport: one connection to the hub with reconnect.
//!
//! # State machine
//!
//! ```text
//!               connect()
//! Disconnected ──────────► Connecting ──ok──► Connected ──remote close──► Disconnected
//!      ▲                      │  ▲                │
//!      │ disconnect()    fail │  │ after delay    │ I/O error
//!      │ (from any state)     ▼  │                ▼
//!      └──────────────────── Error ◄──────────────┘
//! ```
//!
//! Every transition and every decoded pointer event is published as a
//! [`SessionEvent`] on a `tokio::sync::broadcast` channel.  The channel is
//! bounded: a subscriber that falls behind loses the *oldest* events and is
//! told how many via `RecvError::Lagged`.
//!
//! # Cancellation
//!
//! Each `connect()` starts a *generation*.  The drive task carries its
//! generation number and re-checks it under the state lock before every
//! transition, so a task that was superseded or disconnected can never
//! publish anything.  `disconnect()` also fires a oneshot that aborts the
//! pending connect or backoff sleep immediately.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, trace, warn};

use relay_core::{decode_frame, encode_message, Frame, PointerEvent, ProtocolError, SessionState, WireMessage};

pub mod mock;
pub mod websocket;

/// Default capacity of the session event bus.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

// ── Types ─────────────────────────────────────────────────────────────────────

/// Errors on the transport path.  Only their text crosses into
/// [`SessionEvent::Error`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connect to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("connect to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("socket error: {0}")]
    Io(String),

    #[error("send failed: {0}")]
    Send(String),
}

/// Everything the transport reports to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    /// A connect attempt or the open socket failed; a reconnect is scheduled.
    Error(String),
    Pointer(PointerEvent),
}

/// One inbound WebSocket frame, reduced to what the transport cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    /// Binary payload of the given length; ignored.
    Binary(usize),
    /// Ping / pong / raw control frame; ignored.
    Control,
    /// The peer sent a close frame.
    Close,
}

/// An open bidirectional frame stream.
#[async_trait]
pub trait FrameStream: Send {
    /// Next inbound frame; `None` once the stream has ended cleanly.
    async fn next_frame(&mut self) -> Option<Result<InboundFrame, TransportError>>;

    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Best-effort close handshake.
    async fn close(&mut self);
}

/// Opens frame streams to a URL.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameStream>, TransportError>;
}

/// Transport settings.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub url: String,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
    pub event_capacity: usize,
}

impl TransportConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

// ── Shared state ──────────────────────────────────────────────────────────────

struct Inner {
    state: SessionState,
    generation: u64,
    stop: Option<oneshot::Sender<()>>,
}

struct Shared {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, inner: &mut Inner, state: SessionState) {
        inner.state = state;
        self.state_tx.send_replace(state);
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is not an error for the transport.
        let _ = self.events.send(event);
    }

    /// Transitions and publishes atomically, if `generation` is still current.
    fn transition(&self, generation: u64, state: SessionState, event: Option<SessionEvent>) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        self.set_state(&mut inner, state);
        if let Some(event) = event {
            self.publish(event);
        }
        true
    }

    /// Publishes a pointer event, if `generation` is still current.
    fn emit(&self, generation: u64, event: SessionEvent) -> bool {
        let inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        self.publish(event);
        true
    }
}

// ── TransportSession ──────────────────────────────────────────────────────────

/// The receiver's single connection to the hub.
pub struct TransportSession {
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    config: Arc<TransportConfig>,
}

impl TransportSession {
    pub fn new(config: TransportConfig, connector: Arc<dyn Connector>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Disconnected);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: SessionState::Disconnected,
                    generation: 0,
                    stop: None,
                }),
                state_tx,
                events,
            }),
            connector,
            config: Arc::new(config),
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    /// Watches state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    /// Subscribes to session events.  Subscribe before `connect()` to see the
    /// first `Connected`.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Starts connecting.  A no-op while `Connecting` or `Connected`, and in
    /// the `Error` state, where a reconnect is already scheduled and only
    /// [`disconnect`](Self::disconnect) cancels it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&self) {
        let (generation, stop_rx) = {
            let mut inner = self.shared.lock();
            if inner.state.is_active() || inner.state == SessionState::Error {
                debug!("connect: already {}, ignoring", inner.state);
                return;
            }
            inner.generation += 1;
            if let Some(old) = inner.stop.take() {
                let _ = old.send(());
            }
            let (stop_tx, stop_rx) = oneshot::channel();
            inner.stop = Some(stop_tx);
            self.shared.set_state(&mut inner, SessionState::Connecting);
            (inner.generation, stop_rx)
        };

        tokio::spawn(drive(
            Arc::clone(&self.shared),
            Arc::clone(&self.connector),
            Arc::clone(&self.config),
            generation,
            stop_rx,
        ));
    }

    /// Closes the connection and cancels any pending reconnect.
    ///
    /// Publishes `Disconnected` unless the session already was disconnected.
    pub fn disconnect(&self) {
        let mut inner = self.shared.lock();
        inner.generation += 1;
        if let Some(stop) = inner.stop.take() {
            let _ = stop.send(());
        }
        if inner.state != SessionState::Disconnected {
            self.shared.set_state(&mut inner, SessionState::Disconnected);
            self.shared.publish(SessionEvent::Disconnected);
            info!("transport disconnected by request");
        }
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        if let Some(stop) = self.shared.lock().stop.take() {
            let _ = stop.send(());
        }
    }
}

// ── Drive task ────────────────────────────────────────────────────────────────

enum ReadEnd {
    /// The hub closed the socket.
    Closed,
    Failed(TransportError),
}

async fn drive(
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    config: Arc<TransportConfig>,
    generation: u64,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        debug!("connecting to {}", config.url);
        let attempt = timeout(config.connect_timeout, connector.connect(&config.url));
        let result = tokio::select! {
            _ = &mut stop => return,
            r = attempt => r,
        };
        let opened = match result {
            Ok(r) => r,
            Err(_) => Err(TransportError::Timeout {
                url: config.url.clone(),
                timeout: config.connect_timeout,
            }),
        };

        let failure = match opened {
            Ok(mut stream) => {
                if !shared.transition(generation, SessionState::Connected, Some(SessionEvent::Connected)) {
                    stream.close().await;
                    return;
                }
                info!("connected to {}", config.url);
                send_hello(stream.as_mut()).await;

                let end = tokio::select! {
                    _ = &mut stop => {
                        stream.close().await;
                        return;
                    }
                    end = read_frames(&shared, generation, stream.as_mut()) => end,
                };
                match end {
                    ReadEnd::Closed => {
                        if shared.transition(
                            generation,
                            SessionState::Disconnected,
                            Some(SessionEvent::Disconnected),
                        ) {
                            info!("hub closed the connection");
                        }
                        return;
                    }
                    ReadEnd::Failed(e) => e,
                }
            }
            Err(e) => e,
        };

        warn!("{failure}; reconnecting in {:?}", config.reconnect_delay);
        if !shared.transition(
            generation,
            SessionState::Error,
            Some(SessionEvent::Error(failure.to_string())),
        ) {
            return;
        }

        tokio::select! {
            _ = &mut stop => return,
            _ = sleep(config.reconnect_delay) => {}
        }
        if !shared.transition(generation, SessionState::Connecting, None) {
            return;
        }
    }
}

async fn send_hello(stream: &mut dyn FrameStream) {
    match encode_message(&WireMessage::client_hello_now()) {
        Ok(hello) => {
            if let Err(e) = stream.send_text(hello).await {
                warn!("client_hello not sent: {e}");
            }
        }
        Err(e) => warn!("could not encode client_hello: {e}"),
    }
}

async fn read_frames(shared: &Shared, generation: u64, stream: &mut dyn FrameStream) -> ReadEnd {
    loop {
        let frame = match stream.next_frame().await {
            None | Some(Ok(InboundFrame::Close)) => return ReadEnd::Closed,
            Some(Err(e)) => return ReadEnd::Failed(e),
            Some(Ok(frame)) => frame,
        };
        match frame {
            InboundFrame::Text(text) => match decode_frame(&text) {
                Ok(Frame::Event(event)) => {
                    trace!("received {event}");
                    if !shared.emit(generation, SessionEvent::Pointer(event)) {
                        return ReadEnd::Closed;
                    }
                }
                Ok(Frame::Informational(message)) => debug!("hub says: {message}"),
                Ok(Frame::Hello { .. }) => debug!("ignoring client_hello from hub"),
                Err(ProtocolError::UnknownType(kind)) => debug!("ignoring frame of unknown type {kind:?}"),
                Err(e) => warn!("dropping frame: {e}"),
            },
            InboundFrame::Binary(len) => debug!("ignoring {len}-byte binary frame"),
            InboundFrame::Control | InboundFrame::Close => {}
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
