//! CalibrationController: owns the interactive calibration flow.
//!
//! The controller is the only writer of the [`CalibrationFrame`].  Everything
//! else (status lines, the pipeline's routing decision) reads it through a
//! [`CalibrationView`].
//!
//! Clicks arrive in raw host coordinates while a flow is active, since the
//! corners being captured are host-space corners.  Committing persists the
//! extent through the [`CalibrationStore`]; the running mapper is *not*
//! updated, the new extent takes effect on the next receiver start.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use relay_core::{
    save_extent, CalibrationFrame, CalibrationStep, CalibrationStore, CaptureOutcome, Extent, PointerEvent,
    StoreError,
};

type SharedFrame = Arc<Mutex<Option<CalibrationFrame>>>;

fn lock(frame: &SharedFrame) -> MutexGuard<'_, Option<CalibrationFrame>> {
    frame.lock().unwrap_or_else(|e| e.into_inner())
}

/// Read-only handle on the current calibration flow.
#[derive(Clone)]
pub struct CalibrationView {
    frame: SharedFrame,
}

impl CalibrationView {
    pub fn is_active(&self) -> bool {
        lock(&self.frame).as_ref().is_some_and(CalibrationFrame::is_active)
    }

    /// Step the running flow is waiting for, if any.
    pub fn step(&self) -> Option<CalibrationStep> {
        lock(&self.frame).as_ref().map(CalibrationFrame::step)
    }
}

/// Single writer of the calibration frame.
pub struct CalibrationController {
    frame: SharedFrame,
    store: Arc<dyn CalibrationStore>,
    auto_commit: bool,
}

impl CalibrationController {
    /// `auto_commit` commits the flow as soon as the bottom-right corner is
    /// captured.
    pub fn new(store: Arc<dyn CalibrationStore>, auto_commit: bool) -> Self {
        Self {
            frame: Arc::new(Mutex::new(None)),
            store,
            auto_commit,
        }
    }

    /// Starts a flow, abandoning any flow already running.
    pub fn start(&self) {
        let previous = lock(&self.frame).replace(CalibrationFrame::start());
        if previous.is_some() {
            info!("calibration restarted");
        }
        info!("calibration started: click the top-left corner of the host region");
    }

    pub fn is_active(&self) -> bool {
        self.view().is_active()
    }

    pub fn view(&self) -> CalibrationView {
        CalibrationView {
            frame: Arc::clone(&self.frame),
        }
    }

    /// Feeds a raw host-space click into the running flow.
    ///
    /// Returns [`CaptureOutcome::Inactive`] when no flow is running; the caller
    /// should then treat the click as a normal event.
    pub async fn route_click(&self, event: &PointerEvent) -> CaptureOutcome {
        let outcome = match lock(&self.frame).as_mut() {
            Some(frame) => frame.capture_click(event),
            None => CaptureOutcome::Inactive,
        };

        match outcome {
            CaptureOutcome::TopLeftCaptured(p) => {
                info!("calibration: top-left {p}; now click the bottom-right corner");
            }
            CaptureOutcome::BottomRightCaptured(p) => {
                info!("calibration: bottom-right {p}");
                if self.auto_commit {
                    if let Err(e) = self.commit().await {
                        warn!("calibration not saved: {e}");
                    }
                }
            }
            CaptureOutcome::Inactive => {}
        }
        outcome
    }

    /// Ends the flow and persists its extent.
    ///
    /// Returns `Ok(None)` when no flow was running.  Degenerate geometry
    /// commits the default extent.
    ///
    /// # Errors
    ///
    /// The store's error if persisting failed.  The flow has ended either way.
    pub async fn commit(&self) -> Result<Option<Extent>, StoreError> {
        let Some(frame) = lock(&self.frame).take() else {
            return Ok(None);
        };
        let extent = frame.commit();
        save_extent(self.store.as_ref(), extent).await?;
        info!("calibration {extent} saved; it takes effect on the next receiver start");
        Ok(Some(extent))
    }

    /// Ends the flow without persisting.  Returns whether a flow was running.
    pub fn discard(&self) -> bool {
        match lock(&self.frame).take() {
            Some(frame) => {
                frame.discard();
                info!("calibration cancelled");
                true
            }
            None => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
