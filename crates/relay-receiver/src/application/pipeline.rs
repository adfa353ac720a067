//! ReceiverPipeline: the loop between the transport's event bus and the
//! consumer.
//!
//! ```text
//! TransportSession ──SessionEvent──► ReceiverPipeline ──┬─ calibration active + click ─► CalibrationController
//!     (broadcast bus)                     │              └─ otherwise: map() ─► EventConsumer
//!                                         └─ Connected / Error / Disconnected: logged
//! ```
//!
//! The pipeline task is the only task that touches the render surface.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use relay_core::{CalibrationMapper, CaptureOutcome, PointerEvent};

use crate::application::calibrate::CalibrationController;
use crate::application::consume_events::{ConsumeOutcome, EventConsumer};
use crate::infrastructure::transport::SessionEvent;

/// Counters reported when the pipeline stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub moves: u64,
    pub clicks: u64,
    /// Clicks consumed by the calibration flow.
    pub calibration_clicks: u64,
    pub surface_recreations: u64,
    pub taps_dropped: u64,
    /// Events lost because the pipeline fell behind the bus.
    pub lagged: u64,
    pub connects: u64,
    pub errors: u64,
}

pub struct ReceiverPipeline {
    mapper: CalibrationMapper,
    consumer: EventConsumer,
    calibration: Arc<CalibrationController>,
    stats: PipelineStats,
}

impl ReceiverPipeline {
    pub fn new(mapper: CalibrationMapper, consumer: EventConsumer, calibration: Arc<CalibrationController>) -> Self {
        Self {
            mapper,
            consumer,
            calibration,
            stats: PipelineStats::default(),
        }
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Handles one bus event.  Returns the consumer's outcome for pointer
    /// events that reached it.
    pub async fn handle_event(&mut self, event: SessionEvent) -> Option<ConsumeOutcome> {
        match event {
            SessionEvent::Connected => {
                self.stats.connects += 1;
                info!("receiving from hub");
                None
            }
            SessionEvent::Disconnected => {
                info!("hub connection closed");
                None
            }
            SessionEvent::Error(reason) => {
                self.stats.errors += 1;
                warn!("transport error: {reason}");
                None
            }
            SessionEvent::Pointer(raw) => self.handle_pointer(raw).await,
        }
    }

    async fn handle_pointer(&mut self, raw: PointerEvent) -> Option<ConsumeOutcome> {
        if raw.is_click() && self.calibration.is_active() {
            let outcome = self.calibration.route_click(&raw).await;
            if outcome != CaptureOutcome::Inactive {
                self.stats.calibration_clicks += 1;
                return None;
            }
        }

        let geometry = self.consumer.geometry();
        let mapped = self.mapper.map_event(&raw, geometry.width, geometry.height);
        debug!("{raw} -> {}", mapped.position());
        let outcome = self.consumer.handle(&mapped);
        match outcome {
            ConsumeOutcome::Moved(_) => self.stats.moves += 1,
            ConsumeOutcome::SurfaceRecreated(_) | ConsumeOutcome::SurfaceUnavailable => {
                self.stats.moves += 1;
                self.stats.surface_recreations += 1;
            }
            ConsumeOutcome::Tapped(_) | ConsumeOutcome::TapFailed(_) => self.stats.clicks += 1,
            ConsumeOutcome::TapDropped(_) => {
                self.stats.clicks += 1;
                self.stats.taps_dropped += 1;
            }
        }
        Some(outcome)
    }

    /// Runs until `shutdown` resolves or the bus closes.
    ///
    /// Attaches the surface on entry and detaches it on exit.
    pub async fn run<F>(mut self, mut events: broadcast::Receiver<SessionEvent>, shutdown: F) -> PipelineStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        self.consumer.start();

        loop {
            let event = tokio::select! {
                _ = &mut shutdown => break,
                r = events.recv() => r,
            };
            match event {
                Ok(event) => {
                    self.handle_event(event).await;
                }
                Err(RecvError::Lagged(n)) => {
                    self.stats.lagged += n;
                    warn!("pipeline fell behind; {n} oldest events dropped");
                }
                Err(RecvError::Closed) => {
                    debug!("event bus closed");
                    break;
                }
            }
        }

        self.consumer.stop();
        info!("pipeline stopped: {:?}", self.stats);
        self.stats
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::ScreenGeometry;
    use crate::infrastructure::render::mock::{MockRenderSurface, SurfaceCall, SurfaceProbe};
    use crate::infrastructure::tap::{mock::MockTapDispatcher, TapDispatcherRegistry};
    use relay_core::{load_extent, Extent, MemoryStore, Point};

    struct Harness {
        pipeline: ReceiverPipeline,
        probe: SurfaceProbe,
        taps: Arc<MockTapDispatcher>,
        calibration: Arc<CalibrationController>,
        store: Arc<MemoryStore>,
    }

    fn harness(extent: Extent) -> Harness {
        let (surface, probe) = MockRenderSurface::new();
        let registry = TapDispatcherRegistry::new();
        let taps = Arc::new(MockTapDispatcher::new());
        registry.register(taps.clone());
        let consumer = EventConsumer::new(Box::new(surface), registry, ScreenGeometry::new(1080, 2400));
        let store = Arc::new(MemoryStore::new());
        let calibration = Arc::new(CalibrationController::new(store.clone(), true));
        let pipeline = ReceiverPipeline::new(
            CalibrationMapper::from_extent(extent),
            consumer,
            Arc::clone(&calibration),
        );
        Harness {
            pipeline,
            probe,
            taps,
            calibration,
            store,
        }
    }

    #[tokio::test]
    async fn test_move_is_mapped_into_target_space() {
        // Arrange
        let mut h = harness(Extent::new(1920, 1080));

        // Act
        let outcome = h
            .pipeline
            .handle_event(SessionEvent::Pointer(PointerEvent::moved(960, 540)))
            .await;

        // Assert
        assert_eq!(outcome, Some(ConsumeOutcome::Moved(Point::new(540, 1200))));
        assert_eq!(h.probe.calls().last(), Some(&SurfaceCall::Update(540, 1200)));
    }

    #[tokio::test]
    async fn test_click_is_mapped_and_tapped() {
        let mut h = harness(Extent::new(1920, 1080));

        h.pipeline
            .handle_event(SessionEvent::Pointer(PointerEvent::click(1920, 1080)))
            .await;

        assert_eq!(h.taps.taps(), vec![(1079, 2399)]);
        assert_eq!(h.pipeline.stats().clicks, 1);
    }

    #[tokio::test]
    async fn test_calibration_diverts_clicks_but_not_moves() {
        // Arrange
        let mut h = harness(Extent::new(1920, 1080));
        h.calibration.start();

        // Act
        let first = h
            .pipeline
            .handle_event(SessionEvent::Pointer(PointerEvent::click(0, 0)))
            .await;
        let moved = h
            .pipeline
            .handle_event(SessionEvent::Pointer(PointerEvent::moved(960, 540)))
            .await;
        let second = h
            .pipeline
            .handle_event(SessionEvent::Pointer(PointerEvent::click(2560, 1440)))
            .await;
        let after = h
            .pipeline
            .handle_event(SessionEvent::Pointer(PointerEvent::click(960, 540)))
            .await;

        // Assert
        assert_eq!(first, None);
        assert!(matches!(moved, Some(ConsumeOutcome::Moved(_))));
        assert_eq!(second, None);
        assert!(matches!(after, Some(ConsumeOutcome::Tapped(_))));
        assert_eq!(h.pipeline.stats().calibration_clicks, 2);
        // The new extent is stored; the running mapper keeps the old one.
        assert_eq!(load_extent(h.store.as_ref()).await, Extent::new(2560, 1440));
        assert_eq!(h.taps.taps(), vec![(540, 1200)]);
    }

    #[tokio::test]
    async fn test_transport_events_are_counted_not_rendered() {
        let mut h = harness(Extent::default());

        h.pipeline.handle_event(SessionEvent::Connected).await;
        h.pipeline.handle_event(SessionEvent::Error("reset".into())).await;
        h.pipeline.handle_event(SessionEvent::Disconnected).await;

        let stats = h.pipeline.stats();
        assert_eq!((stats.connects, stats.errors), (1, 1));
        assert!(h.probe.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_attaches_counts_lag_and_detaches_on_shutdown() {
        // Arrange
        let h = harness(Extent::default());
        let (tx, rx) = broadcast::channel(2);
        for x in 0..5 {
            tx.send(SessionEvent::Pointer(PointerEvent::moved(x, 0))).unwrap();
        }
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let probe = h.probe.clone();

        // Act
        let task = tokio::spawn(h.pipeline.run(rx, async {
            let _ = stop_rx.await;
        }));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        stop_tx.send(()).unwrap();
        let stats = task.await.unwrap();

        // Assert
        assert_eq!(stats.lagged, 3);
        assert_eq!(stats.moves, 2);
        let calls = probe.calls();
        assert!(matches!(calls.first(), Some(SurfaceCall::Attach(..))));
        assert_eq!(calls.last(), Some(&SurfaceCall::Detach));
        drop(tx);
    }

    #[tokio::test]
    async fn test_run_stops_when_bus_closes() {
        let h = harness(Extent::default());
        let (tx, rx) = broadcast::channel(4);
        tx.send(SessionEvent::Connected).unwrap();
        drop(tx);

        let stats = h.pipeline.run(rx, std::future::pending()).await;

        assert_eq!(stats.connects, 1);
    }
}
