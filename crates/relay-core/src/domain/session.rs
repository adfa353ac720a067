//! Connection lifecycle state shared by hub and receiver sessions.
//!
//! ```text
//! Disconnected ──► Connecting ──► Connected ──► Disconnected   (remote close)
//!                      │              │
//!                      └──► Error ◄───┘                        (I/O failure)
//!                            │
//!                            └──► Connecting                   (after reconnect delay)
//! ```

use std::fmt;

/// Current state of one logical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No socket; nothing scheduled.
    #[default]
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The socket is open and frames are flowing.
    Connected,
    /// The last attempt or the open socket failed; a reconnect may be pending.
    Error,
}

impl SessionState {
    /// `true` while a connect attempt is running or the socket is open.
    ///
    /// Receiver-side `connect()` is a no-op in these states.
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Connected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Error => "error",
        };
        f.write_str(s)
    }
}
