//! Dispatcher that only logs taps.

use tracing::info;

use super::{DispatchError, TapDispatcher};

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingTapDispatcher;

impl TapDispatcher for LoggingTapDispatcher {
    fn simulate_tap(&self, x: i32, y: i32) -> Result<(), DispatchError> {
        info!("tap at ({x}, {y})");
        Ok(())
    }
}
