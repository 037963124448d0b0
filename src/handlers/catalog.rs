//! Model catalog handlers

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;
use crate::models::{ModelSummary, ModelsResponse};

/// List registered models and the columns they expect
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let reg = &state.registry;
    Json(ModelsResponse {
        default_model: reg.default_model().to_string(),
        target_column: reg.target_column().to_string(),
        feature_columns: reg.feature_columns().to_vec(),
        models: reg
            .models()
            .iter()
            .map(|m| ModelSummary {
                id: m.id.clone(),
                technique: m.technique.clone(),
                hyperparams: m.hyperparams.clone(),
            })
            .collect(),
    })
}

/// Category -> risk mappings, exactly as stored on disk
pub async fn mappings(State(state): State<AppState>) -> Json<Value> {
    Json(state.registry.mappings().raw().clone())
}

/// Landing document when no frontend is deployed
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "models": "/api/models",
        "mappings": "/api/mappings",
        "frontend_missing": state.config.frontend_dir.display().to_string(),
    }))
}
