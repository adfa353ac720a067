//! JSON codec for relay text frames.
//!
//! Decoding is deliberately two-stage.  The frame is first parsed into a
//! generic [`serde_json::Value`] so the codec can tell apart "not JSON",
//! "no `type` field", "a `type` we do not know", and "a known `type` with bad
//! fields".  Receivers log each case differently but never close the
//! connection for any of them.

use serde_json::Value;
use thiserror::Error;

use crate::domain::event::PointerEvent;
use crate::protocol::messages::WireMessage;

/// Errors raised while encoding or decoding a frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame text is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// The frame is JSON but has no string `type` field.
    #[error("frame has no \"type\" field")]
    MissingType,

    /// The `type` field names a message this protocol does not define.
    #[error("unknown message type: {0:?}")]
    UnknownType(String),

    /// A recognised message type with missing or invalid fields.
    #[error("malformed {kind} frame: {reason}")]
    Malformed { kind: String, reason: String },

    /// Serialization failed.
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

/// A successfully decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A `move` or `click` event.
    Event(PointerEvent),
    /// A `connection_test` greeting; produces no event.
    Informational(String),
    /// A `client_hello` courtesy handshake.
    Hello { timestamp: i64 },
}

const KNOWN_TYPES: [&str; 4] = ["move", "click", "connection_test", "client_hello"];

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one text frame.
///
/// # Errors
///
/// See [`ProtocolError`] for the four decode failure modes.
///
/// # Examples
///
/// ```rust
/// use relay_core::{decode_frame, Frame, PointerEvent};
///
/// let frame = decode_frame(r#"{"type":"move","x":10,"y":20}"#).unwrap();
/// assert_eq!(frame, Frame::Event(PointerEvent::moved(10, 20)));
/// ```
pub fn decode_frame(text: &str) -> Result<Frame, ProtocolError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?
        .to_string();

    if !KNOWN_TYPES.contains(&kind.as_str()) {
        return Err(ProtocolError::UnknownType(kind));
    }

    let msg: WireMessage = serde_json::from_value(value).map_err(|e| ProtocolError::Malformed {
        kind: kind.clone(),
        reason: e.to_string(),
    })?;

    Ok(match msg {
        WireMessage::ConnectionTest { message } => Frame::Informational(message),
        WireMessage::ClientHello { timestamp } => Frame::Hello { timestamp },
        WireMessage::Move { x, y } => Frame::Event(PointerEvent::moved(x, y)),
        WireMessage::Click { x, y } => Frame::Event(PointerEvent::click(x, y)),
    })
}

/// Encodes any [`WireMessage`] as a JSON text frame.
///
/// # Errors
///
/// [`ProtocolError::Encode`] if serde fails, which the current message set
/// cannot trigger.
pub fn encode_message(msg: &WireMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Encodes a pointer event as a `move` / `click` frame.
///
/// # Errors
///
/// Same as [`encode_message`].
pub fn encode_event(event: &PointerEvent) -> Result<String, ProtocolError> {
    encode_message(&WireMessage::from(*event))
}
