//! EventConsumer: applies mapped pointer events to the cursor surface and the
//! tap dispatcher.
//!
//! The consumer runs on the single render context.  It never returns an
//! error: every failure is logged and reported through [`ConsumeOutcome`] so
//! the event loop keeps going.
//!
//! # Recovery
//!
//! A surface that rejects a position update is assumed stale (the host tore
//! the overlay down underneath us).  The consumer detaches it and attaches a
//! fresh one at the centred home position; the next move puts the cursor back
//! where it belongs.

use std::time::Duration;

use tracing::{debug, trace, warn};

use relay_core::{Point, PointerEvent, PointerKind};

use crate::domain::{ScreenGeometry, CURSOR_SIZE};
use crate::infrastructure::render::RenderSurface;
use crate::infrastructure::tap::{DispatchError, TapDispatcherRegistry};

/// Upper bound on the click animation.
pub const CLICK_ANIMATION: Duration = Duration::from_millis(300);

/// What handling one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The cursor moved to the point.
    Moved(Point),
    /// The update failed; the surface was re-attached at the given home point.
    SurfaceRecreated(Point),
    /// The update failed and so did re-attaching.
    SurfaceUnavailable,
    Tapped(Point),
    /// No dispatcher is registered; the tap was dropped.
    TapDropped(Point),
    /// The dispatcher rejected the tap.
    TapFailed(Point),
}

/// Drives one [`RenderSurface`] and the registered tap dispatcher.
pub struct EventConsumer {
    surface: Box<dyn RenderSurface>,
    taps: TapDispatcherRegistry,
    geometry: ScreenGeometry,
    attached: bool,
}

impl EventConsumer {
    pub fn new(surface: Box<dyn RenderSurface>, taps: TapDispatcherRegistry, geometry: ScreenGeometry) -> Self {
        Self {
            surface,
            taps,
            geometry,
            attached: false,
        }
    }

    pub fn geometry(&self) -> ScreenGeometry {
        self.geometry
    }

    /// Attaches the surface at the home position.
    pub fn start(&mut self) {
        let home = self.home();
        match self.surface.attach(home.x, home.y) {
            Ok(()) => {
                self.attached = true;
                debug!("cursor surface attached at {home}");
            }
            Err(e) => warn!("could not attach cursor surface: {e}"),
        }
    }

    /// Detaches the surface.
    pub fn stop(&mut self) {
        if self.attached {
            self.surface.detach();
            self.attached = false;
            debug!("cursor surface detached");
        }
    }

    /// Applies one event already mapped into target-screen space.
    pub fn handle(&mut self, event: &PointerEvent) -> ConsumeOutcome {
        let at = event.position();
        match event.kind() {
            PointerKind::Move => self.handle_move(at),
            PointerKind::Click => self.handle_click(at),
        }
    }

    fn handle_move(&mut self, at: Point) -> ConsumeOutcome {
        match self.surface.update_position(at.x, at.y) {
            Ok(()) => {
                trace!("cursor at {at}");
                ConsumeOutcome::Moved(at)
            }
            Err(e) => {
                warn!("cursor update to {at} failed: {e}; recreating surface");
                self.recreate_surface()
            }
        }
    }

    fn handle_click(&mut self, at: Point) -> ConsumeOutcome {
        if let Err(e) = self.surface.animate_click(CLICK_ANIMATION) {
            warn!("click animation failed: {e}");
        }

        match self.taps.dispatch(at.x, at.y) {
            Ok(()) => {
                debug!("tap dispatched at {at}");
                ConsumeOutcome::Tapped(at)
            }
            Err(DispatchError::Unavailable) => {
                warn!("tap at {at} dropped: no tap dispatcher registered");
                ConsumeOutcome::TapDropped(at)
            }
            Err(e) => {
                warn!("{e}");
                ConsumeOutcome::TapFailed(at)
            }
        }
    }

    fn recreate_surface(&mut self) -> ConsumeOutcome {
        self.surface.detach();
        let home = self.home();
        match self.surface.attach(home.x, home.y) {
            Ok(()) => {
                self.attached = true;
                ConsumeOutcome::SurfaceRecreated(home)
            }
            Err(e) => {
                self.attached = false;
                warn!("could not re-attach cursor surface: {e}");
                ConsumeOutcome::SurfaceUnavailable
            }
        }
    }

    fn home(&self) -> Point {
        self.geometry.cursor_home(CURSOR_SIZE)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
