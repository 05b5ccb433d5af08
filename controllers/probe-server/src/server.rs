//! Axum HTTP server exposing the probe endpoints

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ProbeError;
use crate::prober::Prober;

async fn readyz(State(prober): State<Arc<Prober>>) -> StatusCode {
    prober.readyz().await
}

async fn healthz(State(prober): State<Arc<Prober>>) -> StatusCode {
    prober.healthz().await
}

/// Router serving `GET /readyz` and `GET /healthz`.
pub fn router(prober: Arc<Prober>) -> Router {
    Router::new()
        .route("/readyz", get(readyz))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(prober)
}

/// Serves the probe endpoints on `addr` until `shutdown` resolves.
pub async fn run_server<S>(addr: SocketAddr, prober: Arc<Prober>, shutdown: S) -> Result<(), ProbeError>
where
    S: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!("Probe server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(prober))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Probe server stopped");
    Ok(())
}
