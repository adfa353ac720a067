//! # relay-receiver
//!
//! Consumer-side half of cursor-relay.  The receiver keeps one WebSocket
//! connection to the hub, maps every pointer event from host space into its
//! own screen space, moves a cursor overlay, and synthesizes taps.
//!
//! # How an event travels (for beginners)
//!
//! 1. The hub sends `{"type":"move","x":960,"y":540}` as a text frame.
//! 2. [`TransportSession`](infrastructure::transport::TransportSession)
//!    decodes it and publishes `SessionEvent::Pointer` on a bounded
//!    broadcast bus.  If the connection fails it waits a fixed delay and
//!    reconnects on its own.
//! 3. [`ReceiverPipeline`](application::ReceiverPipeline) takes the event off
//!    the bus.  While a calibration flow is running, clicks go to the
//!    [`CalibrationController`](application::CalibrationController) instead.
//! 4. Everything else is mapped with the calibration extent, so `(960, 540)`
//!    on a 1920×1080 host lands at `(540, 1200)` on a 1080×2400 phone.
//! 5. [`EventConsumer`](application::EventConsumer) moves the overlay or
//!    animates a click and asks the registered tap dispatcher to tap.
//!
//! # Layers
//!
//! - **`domain`** – receiver configuration and screen geometry.
//! - **`application`** – consumer, calibration flow, pipeline.
//! - **`infrastructure`** – transport, render surface, tap dispatch, storage.

pub mod application;
pub mod domain;
pub mod infrastructure;
