use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let _ = state.config.current();
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// Ready once at least one provider is configured and not currently on
/// cooldown. Zero configured providers is never ready: there is nothing to
/// route to.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.config.current();
    let now = std::time::Instant::now();
    let has_free_provider = snapshot
        .providers
        .keys()
        .any(|id| !state.cooldowns.is_on_cooldown(id, now).on_cooldown);

    if has_free_provider {
        (StatusCode::OK, Json(json!({ "ready": true })))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "ready": false })))
    }
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render_prometheus(),
    )
}
