//! HTTP route handlers.
//!
//! `/` greets and mutates the shared flags, `/health` and `/readiness` project
//! them for the container scheduler. Routes answer any method. Every response
//! is marked `no-store` since each one reflects mutable process state.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod greeting;
pub mod health;
pub mod readiness;

use axum::http::header::{HeaderValue, CACHE_CONTROL};
use axum::http::StatusCode;
use axum::{middleware, routing::any, Router};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};

use crate::config::CACHE_CONTROL_NO_STORE;
use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Creates the Axum router with the greeting and probe routes.
pub fn create_router(state: AppState) -> Router {
    let read_timeout = state.config.http.read_timeout();
    let write_timeout = state.config.http.write_timeout();

    let greeting_routes = Router::new().route("/", any(greeting::greet));

    let probe_routes = Router::new()
        .route("/health", any(health::health))
        .route("/readiness", any(readiness::readiness));

    Router::new()
        .merge(greeting_routes)
        .merge(probe_routes)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_NO_STORE),
        ))
        // Bounds reading a request body; the request head is bounded by the listener
        .layer(RequestBodyTimeoutLayer::new(read_timeout))
        // Bounds producing the response
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            write_timeout,
        ))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
