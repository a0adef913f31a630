//! HTTP API
//!
//! Thin transport over [`MenuDetector`]:
//! - `POST /analyze` analyzes a named capture
//! - `GET /latest` analyzes the newest capture
//! - `GET /healthz` liveness

pub mod error;
pub mod handlers;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::analysis::MenuDetector;

use handlers::{analyze_handler, health_handler, latest_handler};

/// State shared by all handlers
#[derive(Clone)]
pub struct ApiState {
    pub detector: Arc<MenuDetector>,
    /// Hard deadline for one analysis
    pub request_timeout: Duration,
}

/// Create the API router
pub fn create_router(detector: Arc<MenuDetector>) -> Router {
    let request_timeout = Duration::from_secs(detector.config().server.request_timeout_secs);
    let state = ApiState {
        detector,
        request_timeout,
    };

    Router::new()
        .route("/analyze", post(analyze_handler))
        .route("/latest", get(latest_handler))
        .route("/healthz", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(detector: Arc<MenuDetector>, host: &str, port: u16) -> Result<()> {
    let router = create_router(detector);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
