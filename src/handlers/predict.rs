//! Single prediction handler

use axum::{extract::State, Json};
use serde_json::Value;

use crate::{AppState, AppResult, AppError};
use crate::features::{mapping::json_text, RawBatch};
use crate::models::{PredictSingleRequest, PredictSingleResponse};

/// Predict one flight with the requested (or default) model
pub async fn predict_single(
    State(state): State<AppState>,
    Json(req): Json<PredictSingleRequest>,
) -> AppResult<Json<PredictSingleResponse>> {
    let reg = &state.registry;
    let model_id = req
        .model_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| reg.default_model().to_string());
    let model = reg.require(&model_id)?;

    // Missing features are imputed as 0 before encoding
    let columns = reg.feature_columns().to_vec();
    let row = columns
        .iter()
        .map(|c| match req.features.get(c) {
            None | Some(Value::Null) => "0".to_string(),
            Some(v) => json_text(v),
        })
        .collect();
    let batch = RawBatch::new(columns, vec![row]);

    let x = reg.encoder().encode(&batch)?;
    let label = model
        .classifier
        .predict(&x)?
        .first()
        .copied()
        .ok_or_else(|| AppError::InternalError("Model returned no prediction".to_string()))?;

    tracing::debug!("Prediction {} -> {}", model_id, label);

    Ok(Json(PredictSingleResponse {
        model_id,
        prediction: label.to_string(),
    }))
}
