//! Hub configuration types.
//!
//! [`HubConfig`] is built once in `main.rs` from CLI arguments and then
//! shared read-only with the accept loop.  No environment variables are read
//! here; that is the CLI layer's job.

use std::net::SocketAddr;
use std::time::Duration;

use relay_core::{Extent, DEFAULT_EXTENT};

/// Default WebSocket port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default HTTP health-check port.
pub const DEFAULT_HEALTH_PORT: u16 = 8081;

/// Default per-session outbound buffer, in frames.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// All runtime configuration for the hub.
///
/// # Example
///
/// ```rust
/// use relay_hub::domain::HubConfig;
///
/// let cfg = HubConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8080);
/// assert_eq!(cfg.health_addr.map(|a| a.port()), Some(8081));
/// assert!(cfg.simulation.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: SocketAddr,

    /// Address of the `GET /healthcheck` listener, or `None` to disable it.
    pub health_addr: Option<SocketAddr>,

    /// Frames a session may have queued before it is considered too slow and
    /// dropped.
    pub queue_capacity: usize,

    /// When set, the hub is fed by the simulated random-walk source instead
    /// of a native capture hook.
    pub simulation: Option<SimulationConfig>,
}

impl Default for HubConfig {
    /// | Field          | Default        |
    /// |----------------|----------------|
    /// | bind_addr      | `0.0.0.0:8080` |
    /// | health_addr    | `0.0.0.0:8081` |
    /// | queue_capacity | 64             |
    /// | simulation     | `None`         |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            health_addr: Some(SocketAddr::from(([0, 0, 0, 0], DEFAULT_HEALTH_PORT))),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            simulation: None,
        }
    }
}

/// Parameters of the simulated capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Host-space bounds of the random walk, inclusive on both ends.
    pub extent: Extent,
    /// Delay between generated move events.
    pub interval: Duration,
    /// Largest per-axis step of one move, in pixels.
    pub max_step: i32,
    /// One move in `click_one_in` is followed by a click.
    pub click_one_in: u32,
    /// RNG seed; equal seeds produce equal walks.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            extent: DEFAULT_EXTENT,
            interval: Duration::from_millis(50),
            max_step: 20,
            click_one_in: 50,
            seed: 0x5EED_CAFE_F00D_D00D,
        }
    }
}
