//! Greeting endpoint.
//!
//! Every call feeds the `name` query parameter through the flag rules before
//! rendering, so `/?name=sad` flips `/health` and `/?name=busy` flips
//! `/readiness`.

use axum::extract::{Query, State};
use axum::http::StatusCode;

use crate::config::DEFAULT_GUEST_NAME;
use crate::flags::FlagSnapshot;
use crate::identity::display_tail;
use crate::state::AppState;

/// Greeting handler for `GET /`.
///
/// The query is taken as raw key/value pairs so repeated or unexpected keys
/// never cause a rejection. The first `name` wins; absent or empty means guest.
pub async fn greet(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> (StatusCode, String) {
    let name = requested_name(&params);

    let flags = state.flags.apply_name(name);

    let identity = state.identity.resolve();
    let host_tail = display_tail(&identity, state.config.identity.max_display_chars);

    tracing::info!(name = %name, "Received greeting request");

    (StatusCode::OK, render(name, host_tail, flags))
}

fn requested_name(params: &[(String, String)]) -> &str {
    params
        .iter()
        .find(|(key, _)| key == "name")
        .map(|(_, value)| value.as_str())
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_GUEST_NAME)
}

fn render(name: &str, host_tail: &str, flags: FlagSnapshot) -> String {
    format!(
        "Hello, {} from container {} (sad: {}, busy: {})\n",
        name, host_tail, flags.distress, flags.congestion
    )
}
