//! Tap dispatch port and the registry the host plugs a dispatcher into.
//!
//! Synthesizing a tap needs a platform capability (an accessibility service on
//! phones, an input-injection API elsewhere) that may come and go while the
//! receiver runs.  The host registers an implementation of [`TapDispatcher`]
//! in a [`TapDispatcherRegistry`] when the capability becomes available and
//! unregisters it when it goes away.  The consumer looks the dispatcher up on
//! every click and drops the tap if none is registered.

use std::sync::{Arc, RwLock};

use thiserror::Error;

pub mod headless;
pub mod mock;

/// Why a tap could not be delivered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No dispatcher is registered.
    #[error("no tap dispatcher registered")]
    Unavailable,

    /// The dispatcher refused the gesture.
    #[error("tap at ({x}, {y}) rejected: {reason}")]
    Rejected { x: i32, y: i32, reason: String },
}

/// Synthesizes a tap at target-screen coordinates.  Fire-and-forget: the
/// result reports only whether the gesture was accepted for dispatch.
pub trait TapDispatcher: Send + Sync {
    fn simulate_tap(&self, x: i32, y: i32) -> Result<(), DispatchError>;
}

/// Shared slot holding the currently registered dispatcher, if any.
///
/// Cloning yields another handle to the same slot.
#[derive(Clone, Default)]
pub struct TapDispatcherRegistry {
    slot: Arc<RwLock<Option<Arc<dyn TapDispatcher>>>>,
}

impl TapDispatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `dispatcher`, replacing any previous one.
    pub fn register(&self, dispatcher: Arc<dyn TapDispatcher>) {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = Some(dispatcher);
    }

    /// Removes the current dispatcher.  Returns whether one was registered.
    pub fn unregister(&self) -> bool {
        self.slot
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some()
    }

    pub fn current(&self) -> Option<Arc<dyn TapDispatcher>> {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_registered(&self) -> bool {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Dispatches through the current dispatcher.
    pub fn dispatch(&self, x: i32, y: i32) -> Result<(), DispatchError> {
        match self.current() {
            Some(dispatcher) => dispatcher.simulate_tap(x, y),
            None => Err(DispatchError::Unavailable),
        }
    }
}

impl std::fmt::Debug for TapDispatcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapDispatcherRegistry")
            .field("registered", &self.is_registered())
            .finish()
    }
}
