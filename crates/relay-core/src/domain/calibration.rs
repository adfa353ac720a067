//! Two-point calibration: the capture frame and the coordinate mapper.
//!
//! The host and the target device rarely share a resolution, and the host
//! region the operator wants to mirror is not always the whole desktop.
//! Calibration asks the operator to click the top-left and then the
//! bottom-right corner of that region; the difference is the *extent* that
//! gets mapped onto the full target screen.
//!
//! ```text
//! host space                                target space
//! ┌────────────────────────────┐            ┌──────────┐
//! │  top_left                  │            │(0,0)     │
//! │     ┌──────────────┐       │   map()    │          │
//! │     │   ● raw      │  ───────────────►  │    ●     │
//! │     └──────────────┘       │            │          │
//! │               bottom_right │            │  (w-1,h-1)
//! └────────────────────────────┘            └──────────┘
//! ```
//!
//! [`CalibrationFrame`] is the interactive capture state.  Committing or
//! discarding it consumes the frame, so one flow can never do both.
//! [`CalibrationMapper`] is the immutable transform used by the receiver.

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use super::event::{Point, PointerEvent};

/// Host extent assumed when no valid calibration exists.
pub const DEFAULT_EXTENT: Extent = Extent {
    width: 1920,
    height: 1080,
};

/// Stored extents larger than this on either axis are rejected as implausible.
pub const EXTENT_SANITY_CEILING: i32 = 10_000;

/// Errors describing why calibration geometry was rejected.
///
/// None of these are fatal: every caller substitutes [`DEFAULT_EXTENT`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    /// The captured corners do not span a positive area.
    #[error("degenerate calibration geometry: {width}x{height}")]
    Degenerate { width: i32, height: i32 },

    /// A persisted extent is zero, negative, or above the sanity ceiling.
    #[error("stored calibration {width}x{height} outside 1..={ceiling}")]
    OutOfRange { width: i64, height: i64, ceiling: i32 },

    /// No persisted calibration was found.
    #[error("no stored calibration")]
    Missing,
}

/// Width and height of the calibrated host region, in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: i32,
    pub height: i32,
}

impl Extent {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Validates a persisted `(max_x, max_y)` pair.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::Missing`] if either value is absent, and
    /// [`CalibrationError::OutOfRange`] if either is ≤ 0 or above
    /// [`EXTENT_SANITY_CEILING`].
    pub fn from_stored(max_x: Option<i64>, max_y: Option<i64>) -> Result<Self, CalibrationError> {
        let (Some(w), Some(h)) = (max_x, max_y) else {
            return Err(CalibrationError::Missing);
        };
        let ceiling = i64::from(EXTENT_SANITY_CEILING);
        if w <= 0 || h <= 0 || w > ceiling || h > ceiling {
            return Err(CalibrationError::OutOfRange {
                width: w,
                height: h,
                ceiling: EXTENT_SANITY_CEILING,
            });
        }
        // Both values are within 1..=10_000, so the narrowing casts are lossless.
        Ok(Self::new(w as i32, h as i32))
    }
}

impl Default for Extent {
    fn default() -> Self {
        DEFAULT_EXTENT
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ── Interactive capture ───────────────────────────────────────────────────────

/// Which corner the next calibration click will capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    /// Step 1: waiting for the top-left click.
    TopLeft,
    /// Step 2: waiting for (or re-taking) the bottom-right click.
    BottomRight,
}

impl CalibrationStep {
    /// The 1-based step number shown to the operator.
    pub fn number(self) -> u8 {
        match self {
            CalibrationStep::TopLeft => 1,
            CalibrationStep::BottomRight => 2,
        }
    }
}

/// Result of routing a click into a [`CalibrationFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    TopLeftCaptured(Point),
    BottomRightCaptured(Point),
    /// The frame is not active; the click was not consumed.
    Inactive,
}

/// Interactive two-click capture state.
///
/// Created by [`CalibrationFrame::start`] with the defaults spanning the full
/// default extent.  `step` only moves forward (1 → 2); a second click in
/// step 2 re-takes the bottom-right corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationFrame {
    top_left: Point,
    bottom_right: Point,
    step: CalibrationStep,
    active: bool,
}

impl CalibrationFrame {
    /// Starts a new, active capture flow at step 1.
    pub fn start() -> Self {
        Self {
            active: true,
            ..Self::idle()
        }
    }

    /// A frame holding the defaults with no flow running.
    pub fn idle() -> Self {
        Self {
            top_left: Point::new(0, 0),
            bottom_right: Point::new(DEFAULT_EXTENT.width, DEFAULT_EXTENT.height),
            step: CalibrationStep::TopLeft,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn step(&self) -> CalibrationStep {
        self.step
    }

    pub fn top_left(&self) -> Point {
        self.top_left
    }

    pub fn bottom_right(&self) -> Point {
        self.bottom_right
    }

    /// Records the top-left corner and advances to step 2.
    pub fn capture_top_left(&mut self, x: i32, y: i32) {
        self.top_left = Point::new(x, y);
        self.step = CalibrationStep::BottomRight;
        debug!("calibration: captured top-left ({x}, {y})");
    }

    /// Records the bottom-right corner.
    pub fn capture_bottom_right(&mut self, x: i32, y: i32) {
        self.bottom_right = Point::new(x, y);
        debug!("calibration: captured bottom-right ({x}, {y})");
    }

    /// Routes a click to the capture operation for the current step.
    pub fn capture_click(&mut self, event: &PointerEvent) -> CaptureOutcome {
        if !self.active {
            return CaptureOutcome::Inactive;
        }
        let p = event.position();
        match self.step {
            CalibrationStep::TopLeft => {
                self.capture_top_left(p.x, p.y);
                CaptureOutcome::TopLeftCaptured(p)
            }
            CalibrationStep::BottomRight => {
                self.capture_bottom_right(p.x, p.y);
                CaptureOutcome::BottomRightCaptured(p)
            }
        }
    }

    /// Extent spanned by the captured corners.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::Degenerate`] unless bottom-right is strictly
    /// greater than top-left on both axes.
    pub fn extent(&self) -> Result<Extent, CalibrationError> {
        let width = self.bottom_right.x.saturating_sub(self.top_left.x);
        let height = self.bottom_right.y.saturating_sub(self.top_left.y);
        if width <= 0 || height <= 0 {
            return Err(CalibrationError::Degenerate { width, height });
        }
        Ok(Extent::new(width, height))
    }

    /// Ends the flow and returns the extent to persist.
    ///
    /// Degenerate geometry commits [`DEFAULT_EXTENT`] instead.
    pub fn commit(self) -> Extent {
        match self.extent() {
            Ok(extent) => {
                debug!("calibration committed: {extent}");
                extent
            }
            Err(e) => {
                warn!("{e}; committing default extent {DEFAULT_EXTENT}");
                DEFAULT_EXTENT
            }
        }
    }

    /// Ends the flow without persisting anything.
    pub fn discard(self) -> Self {
        debug!("calibration discarded at step {}", self.step.number());
        Self::idle()
    }
}

impl Default for CalibrationFrame {
    fn default() -> Self {
        Self::idle()
    }
}

// ── Mapping ───────────────────────────────────────────────────────────────────

/// Immutable host → target coordinate transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationMapper {
    top_left: Point,
    extent: Extent,
}

impl CalibrationMapper {
    pub fn new(top_left: Point, extent: Extent) -> Self {
        Self { top_left, extent }
    }

    /// Mapper anchored at the host origin.  Persisted calibration only stores
    /// the extent, so this is what a reload produces.
    pub fn from_extent(extent: Extent) -> Self {
        Self::new(Point::new(0, 0), extent)
    }

    /// Mapper for a frame that is still live (e.g. to preview a capture).
    ///
    /// Degenerate frames keep their top-left but fall back to the default
    /// extent.
    pub fn from_frame(frame: &CalibrationFrame) -> Self {
        Self::new(frame.top_left(), frame.extent().unwrap_or(DEFAULT_EXTENT))
    }

    pub fn top_left(&self) -> Point {
        self.top_left
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Maps a host-space point into a `target_width × target_height` screen.
    ///
    /// The result is always inside `[0, target_width-1] × [0, target_height-1]`.
    /// A zero or negative extent is treated as 1 so the division is always
    /// defined, and so is a non-positive target dimension.
    pub fn map(&self, raw_x: i32, raw_y: i32, target_width: i32, target_height: i32) -> Point {
        let dx = f64::from(self.extent.width.max(1));
        let dy = f64::from(self.extent.height.max(1));
        let tw = target_width.max(1);
        let th = target_height.max(1);

        let proportion_x = (f64::from(raw_x) - f64::from(self.top_left.x)) / dx;
        let proportion_y = (f64::from(raw_y) - f64::from(self.top_left.y)) / dy;

        let x = scale_and_clamp(proportion_x, tw);
        let y = scale_and_clamp(proportion_y, th);
        Point::new(x, y)
    }

    /// Maps an event, preserving its kind.
    pub fn map_event(&self, event: &PointerEvent, target_width: i32, target_height: i32) -> PointerEvent {
        event.with_position(self.map(event.x(), event.y(), target_width, target_height))
    }
}

impl Default for CalibrationMapper {
    fn default() -> Self {
        Self::from_extent(DEFAULT_EXTENT)
    }
}

/// `round(proportion * size)` clamped into `0..size`, computed in `f64` so
/// wild inputs cannot overflow before the clamp.
fn scale_and_clamp(proportion: f64, size: i32) -> i32 {
    let max = f64::from(size - 1);
    (proportion * f64::from(size)).round().clamp(0.0, max) as i32
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Extent validation ─────────────────────────────────────────────────────

    #[test]
    fn test_extent_from_stored_accepts_plausible_values() {
        assert_eq!(
            Extent::from_stored(Some(2560), Some(1440)),
            Ok(Extent::new(2560, 1440))
        );
    }

    #[test]
    fn test_extent_from_stored_missing_value_is_missing_error() {
        assert_eq!(
            Extent::from_stored(None, Some(1080)),
            Err(CalibrationError::Missing)
        );
    }

    #[test]
    fn test_extent_from_stored_rejects_zero_negative_and_huge() {
        for (w, h) in [(0, 1080), (1920, -1), (10_001, 1080), (1920, 50_000)] {
            let result = Extent::from_stored(Some(w), Some(h));
            assert!(
                matches!(result, Err(CalibrationError::OutOfRange { .. })),
                "({w}, {h}) must be rejected"
            );
        }
    }

    #[test]
    fn test_extent_from_stored_accepts_ceiling_exactly() {
        assert!(Extent::from_stored(Some(10_000), Some(10_000)).is_ok());
    }

    // ── Frame lifecycle ───────────────────────────────────────────────────────

    #[test]
    fn test_start_produces_active_frame_at_step_one_with_defaults() {
        let frame = CalibrationFrame::start();
        assert!(frame.is_active());
        assert_eq!(frame.step(), CalibrationStep::TopLeft);
        assert_eq!(frame.top_left(), Point::new(0, 0));
        assert_eq!(frame.bottom_right(), Point::new(1920, 1080));
    }

    #[test]
    fn test_capture_top_left_advances_to_step_two() {
        // Arrange
        let mut frame = CalibrationFrame::start();

        // Act
        frame.capture_top_left(100, 50);

        // Assert
        assert_eq!(frame.top_left(), Point::new(100, 50));
        assert_eq!(frame.step().number(), 2);
    }

    #[test]
    fn test_capture_click_routes_by_step() {
        let mut frame = CalibrationFrame::start();

        let first = frame.capture_click(&PointerEvent::click(10, 20));
        let second = frame.capture_click(&PointerEvent::click(1930, 1100));

        assert_eq!(first, CaptureOutcome::TopLeftCaptured(Point::new(10, 20)));
        assert_eq!(second, CaptureOutcome::BottomRightCaptured(Point::new(1930, 1100)));
        assert_eq!(frame.extent(), Ok(Extent::new(1920, 1080)));
    }

    #[test]
    fn test_second_click_in_step_two_retakes_bottom_right() {
        let mut frame = CalibrationFrame::start();
        frame.capture_click(&PointerEvent::click(0, 0));
        frame.capture_click(&PointerEvent::click(500, 500));
        frame.capture_click(&PointerEvent::click(800, 600));

        assert_eq!(frame.bottom_right(), Point::new(800, 600));
        assert_eq!(frame.step(), CalibrationStep::BottomRight);
    }

    #[test]
    fn test_capture_click_on_idle_frame_is_inactive() {
        let mut frame = CalibrationFrame::idle();
        let outcome = frame.capture_click(&PointerEvent::click(1, 1));
        assert_eq!(outcome, CaptureOutcome::Inactive);
        assert_eq!(frame.top_left(), Point::new(0, 0));
    }

    #[test]
    fn test_commit_valid_frame_returns_computed_extent() {
        let mut frame = CalibrationFrame::start();
        frame.capture_top_left(100, 200);
        frame.capture_bottom_right(2660, 1640);

        assert_eq!(frame.commit(), Extent::new(2560, 1440));
    }

    #[test]
    fn test_commit_degenerate_frame_falls_back_to_default() {
        // Arrange: both corners on the same pixel
        let mut frame = CalibrationFrame::start();
        frame.capture_top_left(100, 100);
        frame.capture_bottom_right(100, 100);

        // Act / Assert
        assert_eq!(frame.commit(), DEFAULT_EXTENT);
    }

    #[test]
    fn test_commit_inverted_frame_falls_back_to_default() {
        let mut frame = CalibrationFrame::start();
        frame.capture_top_left(900, 900);
        frame.capture_bottom_right(100, 1000);
        assert_eq!(frame.commit(), DEFAULT_EXTENT);
    }

    #[test]
    fn test_discard_returns_idle_defaults() {
        let mut frame = CalibrationFrame::start();
        frame.capture_top_left(5, 5);

        let reset = frame.discard();

        assert_eq!(reset, CalibrationFrame::idle());
        assert!(!reset.is_active());
    }

    // ── Mapping ───────────────────────────────────────────────────────────────

    #[test]
    fn test_map_full_hd_center_onto_portrait_phone() {
        // Arrange: identity calibration over a 1920x1080 desktop
        let mapper = CalibrationMapper::from_extent(Extent::new(1920, 1080));

        // Act
        let p = mapper.map(960, 540, 1080, 2400);

        // Assert
        assert_eq!(p, Point::new(540, 1200));
    }

    #[test]
    fn test_map_honours_top_left_offset() {
        let mapper = CalibrationMapper::new(Point::new(100, 100), Extent::new(1000, 500));
        assert_eq!(mapper.map(600, 350, 1000, 1000), Point::new(500, 500));
    }

    #[test]
    fn test_map_degenerate_geometry_does_not_divide_by_zero() {
        // Arrange: top-left == bottom-right, so width/height are 0
        let mapper = CalibrationMapper::new(Point::new(100, 100), Extent::new(0, 0));

        // Act
        let at = mapper.map(100, 100, 1080, 2400);
        let past = mapper.map(101, 99, 1080, 2400);

        // Assert: defined, clamped output
        assert_eq!(at, Point::new(0, 0));
        assert_eq!(past, Point::new(1079, 0));
    }

    #[test]
    fn test_map_clamps_points_outside_calibrated_region() {
        let mapper = CalibrationMapper::default();
        assert_eq!(mapper.map(-500, -500, 1080, 2400), Point::new(0, 0));
        assert_eq!(mapper.map(5000, 5000, 1080, 2400), Point::new(1079, 2399));
    }

    #[test]
    fn test_map_bottom_right_corner_lands_on_last_pixel() {
        let mapper = CalibrationMapper::default();
        assert_eq!(mapper.map(1920, 1080, 1080, 2400), Point::new(1079, 2399));
    }

    #[test]
    fn test_map_output_always_within_target_bounds() {
        let mappers = [
            CalibrationMapper::default(),
            CalibrationMapper::new(Point::new(100, 100), Extent::new(0, 0)),
            CalibrationMapper::new(Point::new(-300, 40), Extent::new(7, 10_000)),
            CalibrationMapper::new(Point::new(i32::MAX, i32::MIN), Extent::new(-5, -5)),
        ];
        let raws = [i32::MIN, -10_000, -1, 0, 1, 959, 1920, 10_000, i32::MAX];
        let targets = [(1, 1), (1080, 2400), (3, 7), (0, 0), (-20, 5)];

        for mapper in &mappers {
            for &rx in &raws {
                for &ry in &raws {
                    for &(tw, th) in &targets {
                        let p = mapper.map(rx, ry, tw, th);
                        let (tw, th) = (tw.max(1), th.max(1));
                        assert!(
                            (0..tw).contains(&p.x) && (0..th).contains(&p.y),
                            "{mapper:?} mapped ({rx},{ry}) into {tw}x{th} as {p}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_map_event_preserves_kind() {
        let mapper = CalibrationMapper::default();
        let mapped = mapper.map_event(&PointerEvent::click(960, 540), 1080, 2400);
        assert!(mapped.is_click());
        assert_eq!(mapped.position(), Point::new(540, 1200));
    }

    #[test]
    fn test_from_frame_with_degenerate_frame_uses_default_extent() {
        let mut frame = CalibrationFrame::start();
        frame.capture_top_left(50, 50);
        frame.capture_bottom_right(10, 10);

        let mapper = CalibrationMapper::from_frame(&frame);

        assert_eq!(mapper.top_left(), Point::new(50, 50));
        assert_eq!(mapper.extent(), DEFAULT_EXTENT);
    }
}
