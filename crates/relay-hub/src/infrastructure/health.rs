//! HTTP health endpoint.
//!
//! `GET /healthcheck` answers with
//!
//! ```json
//! {"status":"ok","timestamp":"2026-01-01T00:00:00.000Z","sessions":2}
//! ```
//!
//! It runs on its own listener so the WebSocket port stays upgrade-only.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use chrono::{SecondsFormat, Utc};
use tokio::net::TcpListener;
use tracing::info;

use crate::application::BroadcastHub;

use super::ws_server::ACCEPT_POLL;

/// Route table for the health listener.
pub fn health_router(hub: Arc<BroadcastHub>) -> Router {
    Router::new()
        .route("/healthcheck", get(health_handler))
        .with_state(hub)
}

async fn health_handler(State(hub): State<Arc<BroadcastHub>>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "sessions": hub.session_count().await,
    });
    (StatusCode::OK, axum::Json(body))
}

/// Serves the health route on an already-bound listener until `running` is
/// cleared.
///
/// # Errors
///
/// Returns an error if the listener's address cannot be read or the HTTP
/// server fails.
pub async fn serve_health(
    listener: TcpListener,
    hub: Arc<BroadcastHub>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let local = listener
        .local_addr()
        .context("failed to read health listener address")?;
    info!("health endpoint on http://{local}/healthcheck");

    axum::serve(listener, health_router(hub))
        .with_graceful_shutdown(async move {
            while running.load(Ordering::Relaxed) {
                tokio::time::sleep(ACCEPT_POLL).await;
            }
        })
        .await
        .context("health server failed")
}
