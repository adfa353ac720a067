//! Infrastructure layer for relay-hub.
//!
//! Everything that touches I/O: the WebSocket accept loop, the health
//! endpoint, the frame sinks that stand in for sockets, and the capture
//! sources that feed the hub.

pub mod capture;
pub mod health;
pub mod sink;
pub mod ws_server;

pub use health::{health_router, serve_health};
pub use ws_server::{run_server, serve};
