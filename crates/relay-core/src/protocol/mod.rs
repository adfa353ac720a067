//! Wire protocol: message types and the JSON text-frame codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_frame, encode_event, encode_message, Frame, ProtocolError};
pub use messages::{WireMessage, CONNECTION_TEST_GREETING};
