//! Domain layer for relay-hub.
//!
//! Only configuration lives here; the pointer event model and wire messages
//! are shared with the receiver and come from `relay-core`.

pub mod config;

pub use config::{HubConfig, SimulationConfig};
