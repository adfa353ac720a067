//! Recording tap dispatcher for tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use super::{DispatchError, TapDispatcher};

/// Records every tap; can be told to reject them.
#[derive(Default)]
pub struct MockTapDispatcher {
    taps: Mutex<Vec<(i32, i32)>>,
    should_fail: AtomicBool,
}

impl MockTapDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Accepted taps, in order.
    pub fn taps(&self) -> Vec<(i32, i32)> {
        self.taps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl TapDispatcher for MockTapDispatcher {
    fn simulate_tap(&self, x: i32, y: i32) -> Result<(), DispatchError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DispatchError::Rejected {
                x,
                y,
                reason: "mock failure".into(),
            });
        }
        self.taps.lock().unwrap_or_else(|e| e.into_inner()).push((x, y));
        Ok(())
    }
}
