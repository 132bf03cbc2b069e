//! HTTP exposition of the metrics using axum.

use std::net::SocketAddr;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::{info, warn};

use crate::error::TelemetryResult;
use crate::metrics::gather_text;

/// Router serving `/metrics` and `/health`.
pub fn metrics_router() -> Router {
    Router::new()
        .route("/metrics", get(serve_metrics))
        .route("/health", get(health))
}

async fn serve_metrics() -> Response {
    match gather_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Run the metrics HTTP server until the task is dropped.
pub async fn run_metrics_server(port: u16) -> TelemetryResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "Starting metrics server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, metrics_router()).await?;

    Ok(())
}
