//! WebSocket server: accept loop and per-connection tasks.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Upgrading each accepted connection to a WebSocket session.
//! 3. Registering the session with the [`BroadcastHub`] through a
//!    [`ChannelSink`], and running a writer task that drains the sink's
//!    queue into the socket.
//! 4. Reading inbound frames.  Receivers may send a `client_hello` or even
//!    pointer events; both are logged and never forwarded, because the relay
//!    has exactly one event source.
//! 5. Unregistering the session when its socket ends.
//! 6. Stopping when the `running` flag is cleared.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};

use relay_core::{decode_frame, Frame};

use crate::application::{BroadcastHub, SessionId};
use crate::domain::config::HubConfig;
use crate::infrastructure::sink::{ChannelSink, OutboundQueue};

/// How often the accept loop re-checks the `running` flag.
pub(crate) const ACCEPT_POLL: Duration = Duration::from_millis(200);

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.bind_addr` and serves until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (port in use, missing
/// permission).
pub async fn run_server(
    config: &HubConfig,
    hub: Arc<BroadcastHub>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {}", config.bind_addr))?;

    serve(listener, hub, config.queue_capacity, running).await
}

/// Accepts connections on an already-bound listener.
///
/// Split from [`run_server`] so tests can bind port 0 and learn the real
/// address before serving.
///
/// # Errors
///
/// Returns an error only if the listener's local address cannot be read.
pub async fn serve(
    listener: TcpListener,
    hub: Arc<BroadcastHub>,
    queue_capacity: usize,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let local = listener
        .local_addr()
        .context("failed to read listener address")?;
    info!("relay hub listening on ws://{local}");

    while running.load(Ordering::Relaxed) {
        // A short timeout keeps the loop responsive to the shutdown flag.
        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                debug!("TCP connection from {peer}");
                let hub = Arc::clone(&hub);
                tokio::spawn(async move {
                    handle_connection(stream, peer, hub, queue_capacity).await;
                });
            }
            Ok(Err(e)) => {
                // Transient (e.g. too many open files); keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {}
        }
    }

    info!("shutdown flag set; closing all sessions");
    hub.close_all().await;
    Ok(())
}

// ── Per-connection handler ────────────────────────────────────────────────────

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    hub: Arc<BroadcastHub>,
    queue_capacity: usize,
) {
    match run_session(stream, peer, hub, queue_capacity).await {
        Ok(()) => info!("connection {peer} closed"),
        Err(e) => warn!("connection {peer} closed with error: {e:#}"),
    }
}

async fn run_session(
    stream: TcpStream,
    peer: SocketAddr,
    hub: Arc<BroadcastHub>,
    queue_capacity: usize,
) -> anyhow::Result<()> {
    let ws = accept_async(stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer}"))?;
    let (ws_tx, mut ws_rx) = ws.split();

    let (sink, queue) = ChannelSink::new(queue_capacity);
    let id = hub.register(peer.to_string(), Arc::new(sink)).await;
    let writer = tokio::spawn(write_frames(id, queue, ws_tx));

    // ── Inbound frames ────────────────────────────────────────────────────────
    while let Some(msg) = ws_rx.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                debug!("session {id}: read error: {e}");
                break;
            }
        };
        match msg {
            WsMessage::Text(text) => log_inbound(id, &text),
            WsMessage::Close(_) => {
                debug!("session {id}: close frame received");
                break;
            }
            WsMessage::Binary(b) => debug!("session {id}: ignoring {}-byte binary frame", b.len()),
            // Pings are answered by tungstenite itself.
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
        }
    }

    hub.unregister(id).await;
    // Unregister closed the sink, so the writer drains to `None` and exits.
    if let Err(e) = writer.await {
        warn!("session {id}: writer task failed: {e}");
    }
    Ok(())
}

/// Drains the session's outbound queue into the socket.
async fn write_frames<S>(id: SessionId, mut queue: OutboundQueue, mut ws_tx: S)
where
    S: futures_util::Sink<WsMessage> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(permit) = queue.next_permit().await {
        let result = ws_tx.send(WsMessage::Text(permit.frame.to_string())).await;
        drop(permit);
        if let Err(e) = result {
            // The hub sees the closed queue on its next broadcast and drops us.
            debug!("session {id}: write failed: {e}");
            return;
        }
    }
    let _ = ws_tx.close().await;
}

/// Logs what a receiver sent us.  Nothing inbound is ever rebroadcast.
fn log_inbound(id: SessionId, text: &str) {
    match decode_frame(text) {
        Ok(Frame::Hello { timestamp }) => info!("session {id}: client_hello (timestamp {timestamp})"),
        Ok(Frame::Event(event)) => debug!("session {id}: inbound {event} ignored"),
        Ok(Frame::Informational(message)) => debug!("session {id}: inbound notice {message:?}"),
        Err(e) => warn!("session {id}: undecodable frame: {e}"),
    }
}
