//! Batch evaluation handler

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    Json,
};
use tokio::task::JoinHandle;

use crate::{AppState, AppResult, AppError};
use crate::evaluation::{EvaluationEngine, EvaluationOptions};
use crate::models::EvaluationReport;
use super::upload::{self, Forwarded};

type EvaluationTask = JoinHandle<AppResult<EvaluationReport>>;

/// Evaluate one or all models against an uploaded labeled CSV.
///
/// The `file` part is streamed into the engine as it arrives; a `model_id`
/// sent before it is checked before any upload bytes are read.
pub async fn evaluate_models(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<EvaluationReport>> {
    let mut model_id: Option<String> = None;
    let mut late_model_id: Option<String> = None;
    let mut task: Option<EvaluationTask> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(read_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("model_id") => {
                let text = field.text().await.map_err(read_error)?;
                let text = text.trim().to_string();
                if text.is_empty() {
                    continue;
                }
                state.registry.require(&text)?;
                if task.is_none() {
                    model_id = Some(text);
                } else {
                    late_model_id = Some(text);
                }
            }
            Some("file") => {
                if task.is_some() {
                    return Err(AppError::ValidationError("Only one file may be uploaded".to_string()));
                }
                let filename = field.file_name().unwrap_or_default().to_string();
                if !filename.to_lowercase().ends_with(".csv") {
                    return Err(AppError::ValidationError("Please upload a CSV file".to_string()));
                }
                tracing::info!(
                    "Evaluating {} against {}",
                    filename,
                    model_id.as_deref().unwrap_or("all models")
                );

                let (tx, reader) = upload::upload_channel();
                let options = EvaluationOptions {
                    chunk_size: state.config.eval_chunk_size,
                    threshold_search: state.config.threshold_search,
                    ..Default::default()
                };
                let registry = state.registry.clone();
                let requested = model_id.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    EvaluationEngine::new(&registry, options).evaluate(reader, requested.as_deref())
                });

                match upload::forward_field(&mut field, &tx).await {
                    Forwarded::Complete => {}
                    // The engine already saw the failure or stopped early; its result carries the error
                    Forwarded::ReadFailed | Forwarded::ReaderClosed => {
                        drop(tx);
                        return finish(handle).await.map(Json);
                    }
                }
                task = Some(handle);
            }
            _ => {}
        }
    }

    let handle = task.ok_or_else(|| AppError::ValidationError("Missing file field".to_string()))?;
    let mut report = finish(handle).await?;

    // A model_id sent after the file narrows the all-models report
    if let Some(id) = late_model_id {
        report.results.retain(|r| r.model_id == id);
    }

    Ok(Json(report))
}

async fn finish(handle: EvaluationTask) -> AppResult<EvaluationReport> {
    handle
        .await
        .map_err(|e| AppError::InternalError(format!("Evaluation task failed: {}", e)))?
}

/// Failures while reading the request body are stream-read failures
fn read_error(err: MultipartError) -> AppError {
    AppError::DataError(format!("Upload read failed: {}", err))
}
