//! # relay-core
//!
//! Shared library for cursor-relay containing the pointer event model, the
//! JSON wire protocol, the two-point calibration mapper, and the calibration
//! storage port.
//!
//! This crate is used by both the hub (capture side) and the receiver
//! (rendering side).  It has no dependencies on sockets, OS input APIs, or
//! rendering toolkits.
//!
//! # Architecture overview (for beginners)
//!
//! cursor-relay streams the host machine's mouse pointer to a remote device.
//! The hub captures pointer moves and clicks and broadcasts them over
//! WebSocket; each receiver maps them into its own screen space, moves an
//! on-screen cursor, and synthesizes taps.
//!
//! - **`domain`** – Pure data and logic: [`PointerEvent`], [`SessionState`],
//!   and the [`CalibrationFrame`] / [`CalibrationMapper`] pair that converts
//!   host-space coordinates into target-space coordinates.
//!
//! - **`protocol`** – How events travel over the wire: one JSON object per
//!   WebSocket text frame, tagged by a `"type"` field.
//!
//! - **`store`** – The async key-value port through which calibration is
//!   persisted, plus an in-memory implementation.

pub mod domain;
pub mod protocol;
pub mod store;

// Re-export the most-used types at the crate root so callers can write
// `relay_core::PointerEvent` instead of `relay_core::domain::event::PointerEvent`.
pub use domain::calibration::{
    CalibrationError, CalibrationFrame, CalibrationMapper, CalibrationStep, CaptureOutcome,
    Extent, DEFAULT_EXTENT, EXTENT_SANITY_CEILING,
};
pub use domain::event::{Point, PointerEvent, PointerKind};
pub use domain::session::SessionState;
pub use protocol::codec::{decode_frame, encode_event, encode_message, Frame, ProtocolError};
pub use protocol::messages::{WireMessage, CONNECTION_TEST_GREETING};
pub use store::{load_extent, save_extent, CalibrationStore, MemoryStore, StoreError};
