//! Domain layer for relay-receiver: configuration and screen geometry.

pub mod config;

pub use config::{ReceiverConfig, ScreenGeometry, CURSOR_SIZE};
