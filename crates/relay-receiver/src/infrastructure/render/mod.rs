//! Cursor render surface port and its adapters.
//!
//! The receiver draws a small cursor overlay on the target screen.  Drawing is
//! owned by the host platform, so the pipeline only sees the
//! [`RenderSurface`] trait:
//!
//! - **`headless`** – logs every call through `tracing`; used by the binary
//!   when no overlay is available.
//! - **`mock`** – records calls and can be told to fail; used in tests.
//!
//! All methods take `&mut self`: one surface lives on one render context and
//! is driven by exactly one `EventConsumer`.

use std::time::Duration;

use thiserror::Error;

pub mod headless;
pub mod mock;

/// A surface operation the host rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The surface has not been attached, or was torn down underneath us.
    #[error("render surface is not attached")]
    Detached,

    /// The host refused the operation.
    #[error("render surface rejected {op}: {reason}")]
    Rejected { op: &'static str, reason: String },
}

/// An on-screen cursor overlay.
pub trait RenderSurface: Send {
    /// Creates the overlay with its top-left corner at `(x, y)`.
    fn attach(&mut self, x: i32, y: i32) -> Result<(), RenderError>;

    /// Moves the overlay.  Fails if the surface went stale.
    fn update_position(&mut self, x: i32, y: i32) -> Result<(), RenderError>;

    /// Plays the click animation.  Must return within `duration`.
    fn animate_click(&mut self, duration: Duration) -> Result<(), RenderError>;

    /// Removes the overlay.  Safe to call on a detached surface.
    fn detach(&mut self);
}
