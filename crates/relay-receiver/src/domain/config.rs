//! Receiver configuration types.
//!
//! [`ReceiverConfig`] is assembled in `main.rs` from CLI arguments.  The
//! transport, consumer and calibration controller each take the slice of it
//! they need.

use std::path::PathBuf;
use std::time::Duration;

use relay_core::Point;

/// Edge length of the rendered cursor, in target pixels.
pub const CURSOR_SIZE: i32 = 32;

/// Size of the target screen the cursor is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub width: i32,
    pub height: i32,
}

impl ScreenGeometry {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Top-left corner that centres a `cursor_size` cursor on the screen.
    ///
    /// This is where a fresh render surface is attached.
    pub fn cursor_home(&self, cursor_size: i32) -> Point {
        Point::new(
            self.width / 2 - cursor_size / 2,
            self.height / 2 - cursor_size / 2,
        )
    }
}

impl Default for ScreenGeometry {
    /// A 1080×2400 portrait phone.
    fn default() -> Self {
        Self::new(1080, 2400)
    }
}

/// All runtime configuration for the receiver.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// WebSocket URL of the hub, e.g. `ws://192.168.1.20:8080`.
    pub hub_url: String,

    pub screen: ScreenGeometry,

    /// Fixed delay between a failure and the next connect attempt.
    pub reconnect_delay: Duration,

    /// Upper bound on a single connect attempt.
    pub connect_timeout: Duration,

    /// Where the calibration extent is persisted.  `None` keeps it in memory
    /// for the lifetime of the process.
    pub calibration_file: Option<PathBuf>,

    /// Start an interactive calibration flow on launch.
    pub calibrate: bool,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            hub_url: "ws://127.0.0.1:8080".to_string(),
            screen: ScreenGeometry::default(),
            reconnect_delay: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            calibration_file: None,
            calibrate: false,
        }
    }
}
