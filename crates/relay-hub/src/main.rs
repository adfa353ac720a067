//! cursor-relay hub entry point.
//!
//! Accepts WebSocket connections from receivers and broadcasts captured
//! pointer events to all of them.
//!
//! # Usage
//!
//! ```text
//! relay-hub [OPTIONS]
//!
//! Options:
//!   --bind <ADDR>            Listener IP address [default: 0.0.0.0]
//!   --port <PORT>            Listener port [default: 8080]
//!   --health-port <PORT>     HTTP `GET /healthcheck` port [default: 8081]
//!   --no-health              Do not serve the health endpoint
//!   --queue-capacity <N>     Per-session outbound buffer [default: 64]
//!   --simulate               Feed the hub from a simulated random walk
//!   --sim-width <PX>         Simulated host width [default: 1920]
//!   --sim-height <PX>        Simulated host height [default: 1080]
//!   --sim-interval-ms <MS>   Delay between simulated moves [default: 50]
//!   --sim-seed <N>           Random-walk seed
//! ```
//!
//! | Variable               | Default   |
//! |------------------------|-----------|
//! | `RELAY_BIND`           | `0.0.0.0` |
//! | `RELAY_PORT`           | `8080`    |
//! | `RELAY_HEALTH_PORT`    | `8081`    |
//! | `RELAY_QUEUE_CAPACITY` | `64`      |
//!
//! The native pointer hook is provided by the host platform integration.
//! Without it (and without `--simulate`) the hub still accepts receivers but
//! has nothing to broadcast.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use relay_core::{Extent, EXTENT_SANITY_CEILING};
use relay_hub::application::{pump_events, BroadcastHub};
use relay_hub::domain::{HubConfig, SimulationConfig};
use relay_hub::infrastructure::capture::simulated::SimulatedCaptureSource;
use relay_hub::infrastructure::capture::CaptureSource;
use relay_hub::infrastructure::{run_server, serve_health};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// cursor-relay hub.
///
/// Streams host pointer events to connected receivers over WebSocket.
#[derive(Debug, Parser)]
#[command(name = "relay-hub", about = "Broadcast host pointer events to cursor-relay receivers", version)]
struct Cli {
    /// IP address to bind the WebSocket listener to.
    #[arg(long, default_value = "0.0.0.0", env = "RELAY_BIND")]
    bind: String,

    /// TCP port for the WebSocket listener.
    #[arg(long, default_value_t = 8080, env = "RELAY_PORT")]
    port: u16,

    /// TCP port for the HTTP health endpoint.
    #[arg(long, default_value_t = 8081, env = "RELAY_HEALTH_PORT")]
    health_port: u16,

    /// Do not serve the health endpoint.
    #[arg(long)]
    no_health: bool,

    /// Frames a session may have queued before it is dropped as too slow.
    #[arg(long, default_value_t = 64, env = "RELAY_QUEUE_CAPACITY")]
    queue_capacity: usize,

    /// Drive the hub from a simulated random-walk pointer.
    #[arg(long)]
    simulate: bool,

    /// Width of the simulated host screen, in pixels.
    #[arg(long, default_value_t = 1920)]
    sim_width: i32,

    /// Height of the simulated host screen, in pixels.
    #[arg(long, default_value_t = 1080)]
    sim_height: i32,

    /// Milliseconds between simulated moves.
    #[arg(long, default_value_t = 50)]
    sim_interval_ms: u64,

    /// Seed for the simulated walk; equal seeds replay the same walk.
    #[arg(long)]
    sim_seed: Option<u64>,
}

impl Cli {
    /// Converts the parsed arguments into a [`HubConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address, or if
    /// `--simulate` is given with a non-positive extent or interval.
    fn into_hub_config(self) -> anyhow::Result<HubConfig> {
        let bind_addr: SocketAddr = format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, self.port))?;
        let health_addr =
            (!self.no_health).then(|| SocketAddr::new(bind_addr.ip(), self.health_port));

        let simulation = if self.simulate {
            Some(self.simulation_config()?)
        } else {
            None
        };

        Ok(HubConfig {
            bind_addr,
            health_addr,
            queue_capacity: self.queue_capacity,
            simulation,
        })
    }

    fn simulation_config(&self) -> anyhow::Result<SimulationConfig> {
        let valid = 1..=EXTENT_SANITY_CEILING;
        if !valid.contains(&self.sim_width) || !valid.contains(&self.sim_height) {
            bail!(
                "simulated extent must be 1..={EXTENT_SANITY_CEILING} on both axes, got {}x{}",
                self.sim_width,
                self.sim_height
            );
        }
        if self.sim_interval_ms == 0 {
            bail!("--sim-interval-ms must be greater than zero");
        }

        let defaults = SimulationConfig::default();
        Ok(SimulationConfig {
            extent: Extent::new(self.sim_width, self.sim_height),
            interval: Duration::from_millis(self.sim_interval_ms),
            seed: self.sim_seed.unwrap_or(defaults.seed),
            ..defaults
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_hub_config()?;
    info!("cursor-relay hub starting on {}", config.bind_addr);

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let hub = Arc::new(BroadcastHub::new());

    if let Some(addr) = config.health_addr {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind health listener on {addr}"))?;
        let health = serve_health(listener, Arc::clone(&hub), Arc::clone(&running));
        tokio::spawn(async move {
            if let Err(e) = health.await {
                warn!("health endpoint stopped: {e:#}");
            }
        });
    }

    // ── Capture source ────────────────────────────────────────────────────────
    let capture = match config.simulation {
        Some(sim) => {
            let source = SimulatedCaptureSource::new(sim);
            let events = source
                .start()
                .context("failed to start simulated capture")?;
            let pump = tokio::spawn(pump_events(events, Arc::clone(&hub)));
            Some((source, pump))
        }
        None => {
            warn!("no capture source attached; pass --simulate for a demo feed");
            None
        }
    };

    run_server(&config, Arc::clone(&hub), running).await?;

    if let Some((source, pump)) = capture {
        source.stop();
        match pump.await {
            Ok(stats) => info!("capture stats: {stats:?}"),
            Err(e) => warn!("capture pump task failed: {e}"),
        }
    }

    info!("cursor-relay hub stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
