use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::{Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Response;
use axum::Json;
use futures_util::stream::Stream;
use plexus_config::ReplaceOptions;
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::error::ApiError;
use crate::state::AppState;

/// Rejects any `/v0/*` request whose bearer token doesn't match the
/// configured admin key, before the handler runs.
pub async fn require_admin_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let admin_key = state.config.current().admin_key.expose().to_owned();
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == admin_key => Ok(next.run(request).await),
        _ => Err(ApiError::unauthorized("missing or invalid admin bearer token")),
    }
}

pub async fn get_config(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = state.config.current();
    let yaml = state
        .config
        .current_yaml()
        .await
        .map_err(|err| ApiError::internal(err.to_string()))?;

    Ok(Json(json!({
        "config": yaml,
        "lastModified": snapshot.loaded_at,
        "checksum": snapshot.checksum,
    })))
}

#[derive(Debug, Deserialize)]
pub struct PutConfigBody {
    pub config: String,
    #[serde(default = "default_true")]
    pub validate: bool,
    #[serde(default = "default_true")]
    pub reload: bool,
}

fn default_true() -> bool {
    true
}

pub async fn put_config(
    State(state): State<AppState>,
    Json(body): Json<PutConfigBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = state
        .config
        .replace(&body.config, ReplaceOptions { validate: body.validate, reload: body.reload })
        .await
        .map_err(|err| ApiError::invalid_request(err.to_string()))?;

    Ok(Json(json!({ "checksum": outcome.checksum, "swapped": outcome.swapped })))
}

pub async fn config_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.config.current();
    Json(json!({
        "version": snapshot.version,
        "checksum": snapshot.checksum,
        "lastModified": snapshot.loaded_at,
        "providers": snapshot.providers.len(),
        "models": snapshot.models.len(),
    }))
}

pub async fn reload_config(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let current = state
        .config
        .current_yaml()
        .await
        .map_err(|err| ApiError::internal(err.to_string()))?;
    let outcome = state
        .config
        .replace(&current, ReplaceOptions::default())
        .await
        .map_err(|err| ApiError::invalid_request(err.to_string()))?;

    Ok(Json(json!({ "checksum": outcome.checksum, "swapped": outcome.swapped })))
}

/// SSE feed of `config_change` events, one per successful reload.
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.config.events().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|item| {
        let event = item.ok()?;
        let data = serde_json::to_string(&event).ok()?;
        Some(Ok(Event::default().event("config_change").data(data)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceQuery {
    pub provider: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub exclude_unknown_provider: bool,
    pub enabled_providers: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    200
}

pub async fn get_performance(
    State(state): State<AppState>,
    Query(query): Query<PerformanceQuery>,
) -> Json<serde_json::Value> {
    let snapshot = state.config.current();
    let known_providers: std::collections::HashSet<String> =
        snapshot.providers.keys().map(|id| id.to_string()).collect();
    let enabled: Option<std::collections::HashSet<String>> = query
        .enabled_providers
        .as_ref()
        .map(|list| list.split(',').map(|s| s.trim().to_owned()).collect());

    let entries: Vec<_> = state
        .usage_store
        .recent(query.limit)
        .into_iter()
        .filter(|entry| query.provider.as_deref().is_none_or(|p| entry.provider_id.as_str() == p))
        .filter(|entry| query.model.as_deref().is_none_or(|m| entry.model == m))
        .filter(|entry| !query.exclude_unknown_provider || known_providers.contains(entry.provider_id.as_str()))
        .filter(|entry| enabled.as_ref().is_none_or(|set| set.contains(entry.provider_id.as_str())))
        .collect();

    let by_provider = plexus_usage::tally_by_provider(&entries);
    let by_provider_model: Vec<_> = state
        .metrics
        .per_key_snapshot()
        .into_iter()
        .map(|((provider_id, model), stats)| {
            json!({
                "provider": provider_id.to_string(),
                "model": model,
                "requests": stats.requests,
                "successes": stats.successes,
                "failures": stats.failures,
                "avgTtftMs": stats.avg_ttft_ms(),
                "totalCostUsd": stats.total_cost_usd,
                "costPer1M": stats.cost_per_1m(),
            })
        })
        .collect();

    Json(json!({
        "entries": entries,
        "countsByProvider": by_provider,
        "byProviderModel": by_provider_model,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ClearPerformanceQuery {
    pub model: Option<String>,
}

pub async fn delete_performance(
    State(state): State<AppState>,
    Query(query): Query<ClearPerformanceQuery>,
) -> Json<serde_json::Value> {
    match query.model {
        None => {
            state.usage_store.clear();
            Json(json!({ "cleared": "all" }))
        }
        Some(model) => {
            let removed = state.usage_store.retain_not_matching(|entry| entry.model == model);
            Json(json!({ "cleared": "model", "model": model, "removed": removed }))
        }
    }
}

pub async fn list_quotas(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.config.current();
    let mut out: HashMap<String, Vec<serde_json::Value>> = HashMap::new();
    for provider_id in snapshot.providers.keys() {
        let checker_id: plexus_common::CheckerId = provider_id.as_str().into();
        let windows = state.quotas.snapshot(&checker_id);
        if windows.is_empty() {
            continue;
        }
        out.insert(
            provider_id.to_string(),
            windows
                .into_iter()
                .map(|w| json!({ "window": w.window_type, "limit": w.limit, "used": w.current_usage }))
                .collect(),
        );
    }
    Json(json!(out))
}
