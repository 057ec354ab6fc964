use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::state::AppState;

#[derive(Serialize)]
struct ModelEntry {
    id: String,
    object: &'static str,
    owned_by: String,
    targets: Vec<TargetEntry>,
}

#[derive(Serialize)]
struct TargetEntry {
    provider: String,
    canonical_slug: String,
}

pub async fn list_models(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.config.current();
    let mut models: Vec<ModelEntry> = snapshot
        .models
        .values()
        .map(|alias| ModelEntry {
            id: alias.alias_id.to_string(),
            object: "model",
            owned_by: "plexus".to_owned(),
            targets: alias
                .targets
                .iter()
                .map(|t| TargetEntry { provider: t.provider_id.to_string(), canonical_slug: t.canonical_slug.clone() })
                .collect(),
        })
        .collect();
    models.sort_by(|a, b| a.id.cmp(&b.id));

    Json(json!({ "object": "list", "data": models }))
}
