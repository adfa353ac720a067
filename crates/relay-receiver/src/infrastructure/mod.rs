//! Infrastructure layer for the receiver.
//!
//! **Dependency rule**: this layer may depend on `relay_core` and the
//! receiver's `domain` types, but MUST NOT be imported by `domain`.
//!
//! # Sub-modules
//!
//! - **`transport`** – the `TransportSession` state machine, its
//!   `tokio-tungstenite` connector, and a scripted connector for tests.
//! - **`render`** – the `RenderSurface` port with headless and mock surfaces.
//! - **`tap`** – the `TapDispatcher` port, the registry the host plugs a
//!   dispatcher into, and logging / mock dispatchers.
//! - **`storage`** – TOML calibration store in the platform config directory.

pub mod render;
pub mod storage;
pub mod tap;
pub mod transport;
