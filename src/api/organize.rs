//! On-demand reconciliation trigger

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use super::ApiState;
use crate::error::OrganizeError;

/// Run once and return the report
async fn run(State(state): State<ApiState>) -> Response {
    match state.organizer.run_once().await {
        Ok(report) => Json(report).into_response(),
        Err(OrganizeError::AlreadyRunning) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "a run is already in progress" })),
        )
            .into_response(),
        Err(OrganizeError::Config(e)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "invalid configuration",
                "problems": e.problems.iter().map(ToString::to_string).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub fn router() -> Router<ApiState> {
    Router::new().route("/run", post(run))
}
