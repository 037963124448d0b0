//! Model catalog responses

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub default_model: String,
    pub target_column: String,
    pub feature_columns: Vec<String>,
    pub models: Vec<ModelSummary>,
}

#[derive(Debug, Serialize)]
pub struct ModelSummary {
    pub id: String,
    pub technique: String,
    pub hyperparams: Value,
}
