//! HTTP control API
//!
//! A small REST surface for health checks and on-demand runs, served only
//! when `HTTP_PORT` is configured.

pub mod health;
pub mod organize;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::services::OrganizerService;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct ApiState {
    pub organizer: Arc<OrganizerService>,
}

/// Build the full router with `/api/*` routes and request tracing
pub fn router(state: ApiState) -> Router {
    let api = Router::new()
        .merge(health::router())
        .merge(organize::router());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until the process exits
pub async fn serve(state: ApiState, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Control API listening on {}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
