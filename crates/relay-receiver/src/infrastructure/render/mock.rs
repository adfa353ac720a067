//! Recording render surface for tests.
//!
//! The consumer owns its surface as a `Box<dyn RenderSurface>`, so the mock
//! keeps its log behind an `Arc` and hands out a [`SurfaceProbe`] that the
//! test holds on to.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{RenderError, RenderSurface};

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Attach(i32, i32),
    Update(i32, i32),
    AnimateClick(Duration),
    Detach,
}

#[derive(Default)]
struct State {
    calls: Vec<SurfaceCall>,
    /// Number of upcoming `update_position` calls that fail.
    failing_updates: usize,
    fail_animation: bool,
    fail_attach: bool,
}

/// [`RenderSurface`] that records every call.
pub struct MockRenderSurface {
    state: Arc<Mutex<State>>,
}

/// Test-side view of a [`MockRenderSurface`].
#[derive(Clone)]
pub struct SurfaceProbe {
    state: Arc<Mutex<State>>,
}

impl MockRenderSurface {
    pub fn new() -> (Self, SurfaceProbe) {
        let state = Arc::new(Mutex::new(State::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            SurfaceProbe { state },
        )
    }

    fn record(&self, call: SurfaceCall) -> std::sync::MutexGuard<'_, State> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(call);
        state
    }
}

impl SurfaceProbe {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.lock().calls.clone()
    }

    /// Makes the next `n` position updates fail.
    pub fn fail_next_updates(&self, n: usize) {
        self.lock().failing_updates = n;
    }

    pub fn set_fail_animation(&self, fail: bool) {
        self.lock().fail_animation = fail;
    }

    pub fn set_fail_attach(&self, fail: bool) {
        self.lock().fail_attach = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RenderSurface for MockRenderSurface {
    fn attach(&mut self, x: i32, y: i32) -> Result<(), RenderError> {
        let state = self.record(SurfaceCall::Attach(x, y));
        if state.fail_attach {
            return Err(RenderError::Rejected {
                op: "attach",
                reason: "mock failure".into(),
            });
        }
        Ok(())
    }

    fn update_position(&mut self, x: i32, y: i32) -> Result<(), RenderError> {
        let mut state = self.record(SurfaceCall::Update(x, y));
        if state.failing_updates > 0 {
            state.failing_updates -= 1;
            return Err(RenderError::Detached);
        }
        Ok(())
    }

    fn animate_click(&mut self, duration: Duration) -> Result<(), RenderError> {
        let state = self.record(SurfaceCall::AnimateClick(duration));
        if state.fail_animation {
            return Err(RenderError::Rejected {
                op: "animate_click",
                reason: "mock failure".into(),
            });
        }
        Ok(())
    }

    fn detach(&mut self) {
        self.record(SurfaceCall::Detach);
    }
}
