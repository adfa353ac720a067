//! Application layer for relay-hub.
//!
//! - [`broadcast_hub`] – the session registry and best-effort fan-out.
//! - [`capture_pump`] – moves events from a capture source into the hub and
//!   logs click diagnostics.

pub mod broadcast_hub;
pub mod capture_pump;

pub use broadcast_hub::{BroadcastHub, BroadcastReport, SessionId};
pub use capture_pump::{pump_events, ClickDiagnostics, PumpStats};
