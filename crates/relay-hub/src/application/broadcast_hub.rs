//! Broadcast hub: the set of connected sessions and event fan-out.
//!
//! # Concurrency model (for beginners)
//!
//! `register`, `unregister` and `broadcast` can be called from many tasks at
//! once: the accept loop registers, each connection's reader task
//! unregisters when its socket ends, and the capture pump broadcasts.  All
//! three take the same `tokio::sync::Mutex` around the session map, so a
//! broadcast never iterates over a map that is being modified.
//!
//! While the lock is held, `broadcast` only calls the non-blocking
//! [`FrameSink::try_send`].  A session that cannot accept a frame right now
//! is removed in the same critical section; the hub favours recency over
//! completeness.
//!
//! Closing a removed session's sink happens *after* the lock is released,
//! because closing waits for that session's in-flight socket write.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use relay_core::{encode_event, encode_message, PointerEvent, WireMessage};

use crate::infrastructure::sink::FrameSink;

/// Opaque identifier of one hub-side session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first UUID group is plenty to tell sessions apart in logs.
        let s = self.0.to_string();
        f.write_str(&s[..8])
    }
}

/// Outcome of one [`BroadcastHub::broadcast`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions the frame was queued for.
    pub delivered: usize,
    /// Sessions removed because their send failed.
    pub dropped: usize,
}

struct HubSession {
    peer: String,
    sink: Arc<dyn FrameSink>,
}

/// Registry of open sessions with best-effort fan-out.
#[derive(Default)]
pub struct BroadcastHub {
    sessions: Mutex<HashMap<SessionId, HubSession>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session and greets it with a `connection_test` frame.
    ///
    /// The greeting is best-effort: if it cannot be queued the failure is
    /// logged and the session stays registered.
    pub async fn register(&self, peer: impl Into<String>, sink: Arc<dyn FrameSink>) -> SessionId {
        let id = SessionId::new();
        let peer = peer.into();

        let mut sessions = self.sessions.lock().await;
        match encode_message(&WireMessage::greeting()) {
            Ok(greeting) => {
                if let Err(e) = sink.try_send(Arc::from(greeting)) {
                    warn!("session {id} ({peer}): greeting not sent: {e}");
                }
            }
            Err(e) => warn!("session {id} ({peer}): could not encode greeting: {e}"),
        }
        sessions.insert(id, HubSession { peer: peer.clone(), sink });
        let count = sessions.len();
        drop(sessions);

        info!("session {id} registered from {peer} ({count} connected)");
        id
    }

    /// Removes a session and closes its sink.
    ///
    /// Returns `false` if the session was not registered.  Once this returns,
    /// no frame reaches the session's socket.
    pub async fn unregister(&self, id: SessionId) -> bool {
        let removed = {
            let mut sessions = self.sessions.lock().await;
            sessions.remove(&id).map(|s| (s, sessions.len()))
        };

        match removed {
            Some((session, remaining)) => {
                session.sink.close().await;
                info!(
                    "session {id} ({}) unregistered ({remaining} connected)",
                    session.peer
                );
                true
            }
            None => {
                debug!("unregister: session {id} not registered");
                false
            }
        }
    }

    /// Serializes `event` once and queues it for every registered session.
    ///
    /// Sessions whose send fails are unregistered; the rest still receive the
    /// frame.  With no sessions this is a no-op.
    pub async fn broadcast(&self, event: &PointerEvent) -> BroadcastReport {
        let frame: Arc<str> = match encode_event(event) {
            Ok(text) => Arc::from(text),
            Err(e) => {
                warn!("broadcast: could not encode {event}: {e}");
                return BroadcastReport::default();
            }
        };

        let mut report = BroadcastReport::default();
        let mut dropped = Vec::new();
        {
            let mut sessions = self.sessions.lock().await;
            if sessions.is_empty() {
                debug!("broadcast: no sessions, {event} discarded");
                return report;
            }

            let mut failed = Vec::new();
            for (id, session) in sessions.iter() {
                match session.sink.try_send(Arc::clone(&frame)) {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        warn!("session {id} ({}): send failed: {e}; dropping", session.peer);
                        failed.push(*id);
                    }
                }
            }

            for id in failed {
                if let Some(session) = sessions.remove(&id) {
                    dropped.push(session.sink);
                }
            }
        }
        report.dropped = dropped.len();

        // Close outside the lock; see the module docs.
        for sink in dropped {
            sink.close().await;
        }

        trace!("broadcast {event}: {report:?}");
        report
    }

    /// Number of currently registered sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Identifiers of all currently registered sessions.
    pub async fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.lock().await.keys().copied().collect()
    }

    /// Unregisters every session.  Used when the server stops.
    pub async fn close_all(&self) {
        let drained: Vec<(SessionId, HubSession)> =
            self.sessions.lock().await.drain().collect();
        for (id, session) in drained {
            session.sink.close().await;
            debug!("session {id} closed on shutdown");
        }
    }
}
