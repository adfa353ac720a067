//! Capture pump: drains a capture source into the broadcast hub.
//!
//! The capture source is the single producer; this task is the only caller
//! of [`BroadcastHub::broadcast`], so per-session frame order equals capture
//! order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use relay_core::{Point, PointerEvent, PointerKind};

use super::broadcast_hub::BroadcastHub;

/// Totals reported when the pump ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub moves: u64,
    pub clicks: u64,
    /// Sum of sessions dropped by failed sends over the pump's lifetime.
    pub sessions_dropped: u64,
}

/// Remembers the last move so each click can be checked against it.
///
/// A click far from the last reported move usually means the hook is
/// dropping move events.
#[derive(Debug, Default)]
pub struct ClickDiagnostics {
    last_move: Option<Point>,
}

impl ClickDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a move, or returns a click's distance from the last move.
    pub fn observe(&mut self, event: &PointerEvent) -> Option<f64> {
        match event.kind() {
            PointerKind::Move => {
                self.last_move = Some(event.position());
                None
            }
            PointerKind::Click => {
                let last = self.last_move.unwrap_or_default();
                let dx = f64::from(event.x()) - f64::from(last.x);
                let dy = f64::from(event.y()) - f64::from(last.y);
                Some(dx.hypot(dy))
            }
        }
    }
}

/// Broadcasts every event from `events` until the channel closes.
pub async fn pump_events(mut events: mpsc::Receiver<PointerEvent>, hub: Arc<BroadcastHub>) -> PumpStats {
    let mut stats = PumpStats::default();
    let mut diagnostics = ClickDiagnostics::new();

    while let Some(event) = events.recv().await {
        match diagnostics.observe(&event) {
            Some(distance) => {
                stats.clicks += 1;
                debug!("{event} - distance from last move: {distance:.2} px");
            }
            None => {
                stats.moves += 1;
                trace!("{event}");
            }
        }

        let report = hub.broadcast(&event).await;
        stats.sessions_dropped += report.dropped as u64;
    }

    info!(
        "capture pump finished: {} moves, {} clicks",
        stats.moves, stats.clicks
    );
    stats
}
