//! Capture-source port for the hub.
//!
//! The native pointer hook is an external collaborator.  The hub only sees
//! it through [`CaptureSource`], which hands out a channel of
//! [`PointerEvent`]s in host pixel space.  Two implementations ship with the
//! crate:
//!
//! - [`mock::MockCaptureSource`] lets tests inject events by hand.
//! - [`simulated::SimulatedCaptureSource`] produces a random walk with the
//!   occasional click, for demos on machines without a native hook.

use thiserror::Error;
use tokio::sync::mpsc;

use relay_core::PointerEvent;

pub mod mock;
pub mod simulated;

/// Buffer between a capture source and the capture pump.
pub const CAPTURE_CHANNEL_CAPACITY: usize = 256;

/// Error type for capture operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture source is already running")]
    AlreadyStarted,

    #[error("capture source is not running")]
    NotStarted,

    /// The consumer side of the event channel is gone.
    #[error("capture channel closed")]
    ChannelClosed,

    #[error("capture unavailable: {0}")]
    Unavailable(String),
}

/// Trait abstracting pointer event production.
pub trait CaptureSource: Send + Sync {
    /// Starts capturing and returns the receiving end of the event channel.
    fn start(&self) -> Result<mpsc::Receiver<PointerEvent>, CaptureError>;

    /// Stops capturing.  The channel returned by `start` closes once any
    /// buffered events are drained.
    fn stop(&self);
}
