//! Single prediction request/response

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct PredictSingleRequest {
    #[serde(default)]
    pub model_id: Option<String>,
    /// Raw (pre-encoding) feature values keyed by column name
    #[serde(default)]
    pub features: HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct PredictSingleResponse {
    pub model_id: String,
    pub prediction: String,
}
