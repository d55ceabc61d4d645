//! Readiness probe for container orchestration.

use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

/// Readiness handler for `GET /readiness`.
///
/// Returns 500 `"busy"` while the congestion flag is set, otherwise 200 `"ok"`.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    let response = if state.flags.congestion() {
        (StatusCode::INTERNAL_SERVER_ERROR, "busy")
    } else {
        (StatusCode::OK, "ok")
    };

    tracing::info!(status = response.0.as_u16(), "Readiness handler sent status");
    response
}
