//! # relay-hub
//!
//! Capture-side half of cursor-relay.  The hub accepts WebSocket connections
//! from receivers, greets each one with a `connection_test` frame, and fans
//! every captured pointer event out to all of them.
//!
//! # Architecture overview
//!
//! ```text
//! CaptureSource ──mpsc──► capture_pump ──► BroadcastHub ──► ChannelSink ×N
//!                                                              │
//!                                          ws_server writer ◄──┘ ──► receivers
//! ```
//!
//! - **`domain`** – [`HubConfig`](domain::HubConfig) and simulation settings.
//! - **`application`** – the [`BroadcastHub`](application::BroadcastHub)
//!   session registry and the capture pump.
//! - **`infrastructure`** – WebSocket server, frame sinks, capture sources.

pub mod application;
pub mod domain;
pub mod infrastructure;
