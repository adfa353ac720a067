//! JSON message types carried over the relay WebSocket.
//!
//! Every message is one JSON object in one text frame, discriminated by a
//! `"type"` field:
//!
//! ```json
//! {"type":"connection_test","message":"Connection established"}
//! {"type":"move","x":812,"y":440}
//! {"type":"click","x":812,"y":440}
//! {"type":"client_hello","timestamp":1718000000000}
//! ```
//!
//! `connection_test` is sent by the hub to every new session.  `move` and
//! `click` flow hub → receiver.  `client_hello` is a courtesy frame the
//! receiver sends once after connecting; the hub only logs it.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::domain::event::{PointerEvent, PointerKind};

/// Text of the informational frame a hub sends on accept.
pub const CONNECTION_TEST_GREETING: &str = "Connection established";

/// Every message either side can put on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// Informational greeting; carries no event.
    ConnectionTest { message: String },

    /// Absolute pointer position in the sender's pixel space.
    Move { x: i32, y: i32 },

    /// Primary-button click at a position in the sender's pixel space.
    Click { x: i32, y: i32 },

    /// Receiver handshake.  `timestamp` is milliseconds since the Unix epoch.
    ClientHello { timestamp: i64 },
}

impl WireMessage {
    /// The greeting a hub sends to each newly registered session.
    pub fn greeting() -> Self {
        WireMessage::ConnectionTest {
            message: CONNECTION_TEST_GREETING.to_string(),
        }
    }

    /// A `client_hello` stamped with the current wall-clock time.
    pub fn client_hello_now() -> Self {
        // A clock before 1970 only happens on badly misconfigured devices;
        // the hello is a courtesy, so 0 is an acceptable stamp.
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        WireMessage::ClientHello { timestamp }
    }

    /// Returns the pointer event this message carries, if any.
    pub fn as_event(&self) -> Option<PointerEvent> {
        match *self {
            WireMessage::Move { x, y } => Some(PointerEvent::moved(x, y)),
            WireMessage::Click { x, y } => Some(PointerEvent::click(x, y)),
            WireMessage::ConnectionTest { .. } | WireMessage::ClientHello { .. } => None,
        }
    }
}

impl From<PointerEvent> for WireMessage {
    fn from(event: PointerEvent) -> Self {
        let (x, y) = (event.x(), event.y());
        match event.kind() {
            PointerKind::Move => WireMessage::Move { x, y },
            PointerKind::Click => WireMessage::Click { x, y },
        }
    }
}
