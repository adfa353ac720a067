//! Simulated capture source: a random walk of the pointer.
//!
//! Used by `relay-hub --simulate` to demo the whole pipeline on a machine
//! without a native pointer hook.  The walk starts at the centre of the
//! configured extent, moves up to `max_step` pixels per axis every
//! `interval`, stays inside `[0, width] × [0, height]`, and follows roughly
//! one move in `click_one_in` with a click at the same spot.

use std::sync::Mutex;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use relay_core::{Point, PointerEvent};

use super::{CaptureError, CaptureSource, CAPTURE_CHANNEL_CAPACITY};
use crate::domain::SimulationConfig;

// ── Walk generator ────────────────────────────────────────────────────────────

/// xorshift64*: tiny, fast, and deterministic for a given seed.  Not
/// suitable for anything security-related.
#[derive(Debug, Clone)]
struct XorShift64(u64);

impl XorShift64 {
    fn new(seed: u64) -> Self {
        // A zero state would stay zero forever.
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform-ish integer in `[lo, hi)`; returns `lo` when the range is empty.
    fn range(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        let span = (i64::from(hi) - i64::from(lo)) as u64;
        lo + (self.next_u64() % span) as i32
    }
}

/// Pure state of the walk, separated from the timer so tests can step it.
#[derive(Debug, Clone)]
pub struct RandomWalk {
    position: Point,
    config: SimulationConfig,
    rng: XorShift64,
}

impl RandomWalk {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            position: Point::new(config.extent.width / 2, config.extent.height / 2),
            config,
            rng: XorShift64::new(config.seed),
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Advances one step; returns the move and, sometimes, a click.
    pub fn step(&mut self) -> (PointerEvent, Option<PointerEvent>) {
        let max = self.config.max_step.max(0);
        let dx = self.rng.range(-max, max);
        let dy = self.rng.range(-max, max);

        let w = self.config.extent.width.max(0);
        let h = self.config.extent.height.max(0);
        self.position = Point::new(
            self.position.x.saturating_add(dx).clamp(0, w),
            self.position.y.saturating_add(dy).clamp(0, h),
        );

        let (x, y) = (self.position.x, self.position.y);
        let one_in = self.config.click_one_in.max(1);
        let click = (self.rng.next_u64() % u64::from(one_in) == 0).then(|| PointerEvent::click(x, y));
        (PointerEvent::moved(x, y), click)
    }
}

// ── Capture source ────────────────────────────────────────────────────────────

/// [`CaptureSource`] that feeds a [`RandomWalk`] on a Tokio timer.
pub struct SimulatedCaptureSource {
    config: SimulationConfig,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedCaptureSource {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            task: Mutex::new(None),
        }
    }
}

impl CaptureSource for SimulatedCaptureSource {
    /// Spawns the walk on the current Tokio runtime.
    fn start(&self) -> Result<mpsc::Receiver<PointerEvent>, CaptureError> {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return Err(CaptureError::AlreadyStarted);
        }
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| CaptureError::Unavailable(format!("no Tokio runtime: {e}")))?;

        let (tx, rx) = mpsc::channel(CAPTURE_CHANNEL_CAPACITY);
        let config = self.config;
        *task = Some(handle.spawn(run_walk(config, tx)));

        info!(
            "simulated capture started: {} extent, step ≤{}px every {:?}",
            config.extent, config.max_step, config.interval
        );
        Ok(rx)
    }

    fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap_or_else(|e| e.into_inner()).take() {
            task.abort();
            info!("simulated capture stopped");
        }
    }
}

async fn run_walk(config: SimulationConfig, tx: mpsc::Sender<PointerEvent>) {
    let mut walk = RandomWalk::new(config);
    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let (moved, click) = walk.step();
        if tx.send(moved).await.is_err() {
            break;
        }
        if let Some(click) = click {
            debug!("simulated {click}");
            if tx.send(click).await.is_err() {
                break;
            }
        }
    }
    debug!("simulated capture: consumer gone, walk ended");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use relay_core::Extent;

    use super::*;

    fn config() -> SimulationConfig {
        SimulationConfig {
            extent: Extent::new(200, 100),
            interval: Duration::from_millis(50),
            max_step: 20,
            click_one_in: 5,
            seed: 42,
        }
    }

    #[test]
    fn test_walk_starts_at_centre() {
        assert_eq!(RandomWalk::new(config()).position(), Point::new(100, 50));
    }

    #[test]
    fn test_walk_stays_in_bounds_and_steps_are_bounded() {
        // Arrange
        let mut walk = RandomWalk::new(config());
        let mut prev = walk.position();

        for _ in 0..5_000 {
            // Act
            let (moved, click) = walk.step();

            // Assert
            let p = moved.position();
            assert!((0..=200).contains(&p.x) && (0..=100).contains(&p.y), "{p}");
            assert!((p.x - prev.x).abs() <= 20 && (p.y - prev.y).abs() <= 20);
            if let Some(c) = click {
                assert_eq!(c.position(), p, "clicks happen where the pointer is");
            }
            prev = p;
        }
    }

    #[test]
    fn test_walk_emits_some_clicks() {
        let mut walk = RandomWalk::new(config());
        let clicks = (0..1_000).filter(|_| walk.step().1.is_some()).count();
        assert!(clicks > 0);
    }

    #[test]
    fn test_equal_seeds_produce_equal_walks() {
        let mut a = RandomWalk::new(config());
        let mut b = RandomWalk::new(config());
        for _ in 0..100 {
            assert_eq!(a.step(), b.step());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_source_emits_moves_on_timer() {
        // Arrange
        let source = SimulatedCaptureSource::new(config());
        let mut rx = source.start().expect("runtime available");

        // Act
        let first = rx.recv().await;

        // Assert
        assert!(first.is_some_and(|e| !e.is_click()));
        source.stop();
    }

    #[tokio::test]
    async fn test_simulated_source_start_twice_is_already_started() {
        let source = SimulatedCaptureSource::new(config());
        let _rx = source.start().unwrap();

        assert!(matches!(source.start(), Err(CaptureError::AlreadyStarted)));
        source.stop();
    }

    #[test]
    fn test_start_outside_runtime_is_unavailable() {
        let source = SimulatedCaptureSource::new(config());
        assert!(matches!(source.start(), Err(CaptureError::Unavailable(_))));
    }
}
