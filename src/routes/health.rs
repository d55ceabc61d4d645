//! Liveness probe for container orchestration.
//!
//! Reports the distress flag: a scheduler restarts the container while
//! `/health` keeps answering 500.

use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

/// Health check handler for `GET /health`.
///
/// Returns 500 `"error"` while the distress flag is set, otherwise 200 `"ok"`.
pub async fn health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    let response = if state.flags.distress() {
        (StatusCode::INTERNAL_SERVER_ERROR, "error")
    } else {
        (StatusCode::OK, "ok")
    };

    tracing::info!(status = response.0.as_u16(), "Health handler sent status");
    response
}
