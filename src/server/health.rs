//! Probe and scrape endpoints
//!
//! - `/healthz` - liveness, always 200 while the process runs
//! - `/readyz` - 200 once both controllers are started, 503 before and during shutdown
//! - `/metrics` - Prometheus text format

use crate::server::metrics::SharedMetrics;
use crate::server::shutdown::Shutdown;
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ReadinessState {
    ready: Arc<AtomicBool>,
}

impl ReadinessState {
    /// Starts out not ready
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    /// Flip back to 503 so the pod is taken out of rotation while shutting down
    pub fn set_not_ready(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct ServerState {
    readiness: ReadinessState,
    metrics: SharedMetrics,
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn readyz(State(state): State<ServerState>) -> StatusCode {
    if state.readiness.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics(State(state): State<ServerState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", e),
        )
            .into_response(),
    }
}

fn build_router(readiness: ReadinessState, metrics: SharedMetrics) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(self::metrics))
        .with_state(ServerState { readiness, metrics })
}

/// Serve the probe endpoints on `0.0.0.0:<port>` until `shutdown` fires
pub async fn run_health_server(
    port: u16,
    readiness: ReadinessState,
    metrics: SharedMetrics,
    shutdown: Shutdown,
) -> Result<(), std::io::Error> {
    let app = build_router(readiness, metrics);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(port = %port, "Health and metrics server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.triggered())
        .await
        .map_err(std::io::Error::other)
}
