//! Health check endpoint

use axum::{Json, Router, routing::get};
use serde::Serialize;

use super::ApiState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check - always returns OK if the server is running
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<ApiState> {
    Router::new().route("/health", get(health))
}
