//! Domain layer: pure business logic with no I/O.
//!
//! - [`event`] – the immutable [`PointerEvent`](event::PointerEvent) value.
//! - [`session`] – the connection [`SessionState`](session::SessionState)
//!   shared by hub-side and receiver-side sessions.
//! - [`calibration`] – the two-point calibration frame and the mapper that
//!   turns host pixels into target pixels.

pub mod calibration;
pub mod event;
pub mod session;
