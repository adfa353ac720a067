//! cursor-relay receiver entry point.
//!
//! Connects to a hub, maps its pointer events onto this screen, and drives
//! the cursor overlay and tap dispatcher.
//!
//! # Usage
//!
//! ```text
//! relay-receiver [OPTIONS]
//!
//! Options:
//!   --host <HOST>                   Hub host [default: 127.0.0.1]
//!   --port <PORT>                   Hub port [default: 8080]
//!   --screen-width <PX>             Target screen width [default: 1080]
//!   --screen-height <PX>            Target screen height [default: 2400]
//!   --reconnect-secs <S>            Delay before reconnecting [default: 5]
//!   --connect-timeout-secs <S>      Bound on one connect attempt [default: 10]
//!   --calibration-file <PATH>       Where calibration is stored
//!   --calibrate                     Run the two-click calibration flow
//! ```
//!
//! `RELAY_HOST` and `RELAY_PORT` override the hub address.  Without
//! `--calibration-file` the platform config directory is used
//! (`cursor-relay/calibration.toml`).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use relay_core::{load_extent, CalibrationMapper, CalibrationStore, MemoryStore};
use relay_receiver::application::{CalibrationController, EventConsumer, ReceiverPipeline};
use relay_receiver::domain::{ReceiverConfig, ScreenGeometry};
use relay_receiver::infrastructure::render::headless::HeadlessSurface;
use relay_receiver::infrastructure::storage::{default_calibration_path, TomlCalibrationStore};
use relay_receiver::infrastructure::tap::{headless::LoggingTapDispatcher, TapDispatcherRegistry};
use relay_receiver::infrastructure::transport::{websocket::WsConnector, TransportConfig, TransportSession};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// cursor-relay receiver.
#[derive(Debug, Parser)]
#[command(name = "relay-receiver", about = "Render a cursor-relay hub's pointer on this screen", version)]
struct Cli {
    /// Hub host name or IP address.
    #[arg(long, default_value = "127.0.0.1", env = "RELAY_HOST")]
    host: String,

    /// Hub WebSocket port.
    #[arg(long, default_value_t = 8080, env = "RELAY_PORT")]
    port: u16,

    /// Width of this screen in pixels.
    #[arg(long, default_value_t = 1080)]
    screen_width: i32,

    /// Height of this screen in pixels.
    #[arg(long, default_value_t = 2400)]
    screen_height: i32,

    /// Seconds to wait after a failure before reconnecting.
    #[arg(long, default_value_t = 5)]
    reconnect_secs: u64,

    /// Seconds one connect attempt may take.
    #[arg(long, default_value_t = 10)]
    connect_timeout_secs: u64,

    /// Calibration file path.
    #[arg(long)]
    calibration_file: Option<PathBuf>,

    /// Capture the host region with two clicks, then save it.
    #[arg(long)]
    calibrate: bool,
}

impl Cli {
    /// Converts the parsed arguments into a [`ReceiverConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the screen size, reconnect delay, or connect
    /// timeout is not positive.
    fn into_receiver_config(self) -> anyhow::Result<ReceiverConfig> {
        if self.screen_width <= 0 || self.screen_height <= 0 {
            anyhow::bail!(
                "screen size must be positive, got {}x{}",
                self.screen_width,
                self.screen_height
            );
        }
        if self.reconnect_secs == 0 {
            anyhow::bail!("--reconnect-secs must be greater than zero");
        }
        if self.connect_timeout_secs == 0 {
            anyhow::bail!("--connect-timeout-secs must be greater than zero");
        }

        Ok(ReceiverConfig {
            hub_url: format!("ws://{}:{}", self.host, self.port),
            screen: ScreenGeometry::new(self.screen_width, self.screen_height),
            reconnect_delay: Duration::from_secs(self.reconnect_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            calibration_file: self.calibration_file.or_else(default_calibration_path),
            calibrate: self.calibrate,
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

    let config = Cli::parse().into_receiver_config()?;
    info!("cursor-relay receiver starting; hub {}", config.hub_url);

    // ── Calibration ───────────────────────────────────────────────────────────
    let store: Arc<dyn CalibrationStore> = match &config.calibration_file {
        Some(path) => {
            info!("calibration file: {}", path.display());
            Arc::new(TomlCalibrationStore::new(path))
        }
        None => {
            warn!("no config directory found; calibration will not be persisted");
            Arc::new(MemoryStore::new())
        }
    };
    let extent = load_extent(store.as_ref()).await;
    let mapper = CalibrationMapper::from_extent(extent);

    let calibration = Arc::new(CalibrationController::new(store, config.calibrate));
    if config.calibrate {
        calibration.start();
    }

    // ── Render + tap ──────────────────────────────────────────────────────────
    let taps = TapDispatcherRegistry::new();
    taps.register(Arc::new(LoggingTapDispatcher));
    let consumer = EventConsumer::new(Box::new(HeadlessSurface::new()), taps, config.screen);
    let pipeline = ReceiverPipeline::new(mapper, consumer, calibration);

    // ── Transport ─────────────────────────────────────────────────────────────
    let transport = TransportSession::new(
        TransportConfig {
            reconnect_delay: config.reconnect_delay,
            connect_timeout: config.connect_timeout,
            ..TransportConfig::new(config.hub_url.clone())
        },
        Arc::new(WsConnector),
    );
    let events = transport.subscribe();
    transport.connect();

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    };
    let stats = tokio::spawn(pipeline.run(events, shutdown));

    let stats = stats.await.context("pipeline task failed")?;
    transport.disconnect();
    info!("cursor-relay receiver stopped after {} moves, {} clicks", stats.moves, stats.clicks);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
