//! Evaluation Engine

use std::io::Read;

use uuid::Uuid;

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::features::{FeatureEncoder, RawBatch};
use crate::models::{EvaluationReport, ModelEvaluation};
use crate::registry::{ModelInfo, Registry};
use crate::{AppError, AppResult};
use super::accumulator::ConfusionAccumulator;
use super::chunks::CsvChunks;
use super::threshold::ThresholdConfig;

#[derive(Debug, Clone)]
pub struct EvaluationOptions {
    /// Rows per chunk
    pub chunk_size: usize,

    /// Retain scores and search thresholds; otherwise count at the baseline
    pub threshold_search: bool,

    pub thresholds: ThresholdConfig,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            threshold_search: true,
            thresholds: ThresholdConfig::default(),
        }
    }
}

pub struct EvaluationEngine<'a> {
    registry: &'a Registry,
    options: EvaluationOptions,
}

impl<'a> EvaluationEngine<'a> {
    pub fn new(registry: &'a Registry, options: EvaluationOptions) -> Self {
        Self { registry, options }
    }

    /// Evaluate `requested` (or every registered model) against a labeled CSV.
    ///
    /// The model id is checked before a single byte of `source` is read.
    pub fn evaluate<R: Read>(&self, source: R, requested: Option<&str>) -> AppResult<EvaluationReport> {
        let models = self.registry.select(requested)?;
        self.evaluate_models(
            source,
            self.registry.target_column(),
            self.registry.feature_columns(),
            &models,
        )
    }

    /// All-or-nothing: the first schema, parse or model error aborts the run
    pub fn evaluate_models<R: Read>(
        &self,
        source: R,
        target_column: &str,
        feature_columns: &[String],
        models: &[&ModelInfo],
    ) -> AppResult<EvaluationReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("evaluation", %run_id);
        let _guard = span.enter();

        let encoder = self.registry.encoder();
        let mut accumulators: Vec<ConfusionAccumulator> = models
            .iter()
            .map(|m| {
                if self.options.threshold_search && m.classifier.is_probabilistic() {
                    ConfusionAccumulator::retaining()
                } else {
                    ConfusionAccumulator::counting()
                }
            })
            .collect();

        let mut chunks = CsvChunks::new(source, self.options.chunk_size)?;
        tracing::debug!("Upload columns: {}", chunks.headers().join(", "));
        let mut chunk_count = 0usize;
        for chunk in &mut chunks {
            let chunk = chunk?;
            chunk_count += 1;
            self.process_chunk(encoder, &chunk, target_column, feature_columns, models, &mut accumulators)?;
            tracing::debug!("Chunk {} done ({} rows)", chunk_count, chunk.len());
        }

        if chunks.rows_read() == 0 {
            return Err(AppError::EmptyInputError);
        }

        let results = models
            .iter()
            .zip(&accumulators)
            .map(|(model, acc)| {
                let outcome = acc.finish(&self.options.thresholds);
                tracing::info!(
                    "{}: f1@0.5={:.4} f1@{:.2}={:.4}",
                    model.id,
                    outcome.standard.f1,
                    outcome.threshold,
                    outcome.best.f1
                );
                ModelEvaluation {
                    model_id: model.id.clone(),
                    technique: model.technique.clone(),
                    metrics: outcome.best,
                    standard_metrics: outcome.standard,
                    optimal_threshold: outcome.threshold,
                    rows: acc.rows(),
                }
            })
            .collect();

        tracing::info!(
            "Evaluated {} models over {} rows in {} chunks",
            models.len(),
            chunks.rows_read(),
            chunk_count
        );

        Ok(EvaluationReport { results })
    }

    fn process_chunk(
        &self,
        encoder: &FeatureEncoder,
        chunk: &RawBatch,
        target_column: &str,
        feature_columns: &[String],
        models: &[&ModelInfo],
        accumulators: &mut [ConfusionAccumulator],
    ) -> AppResult<()> {
        let target_idx = chunk.column_index(target_column).ok_or_else(|| {
            AppError::SchemaError(format!("Missing target column: {}", target_column))
        })?;
        if let Some(missing) = feature_columns.iter().find(|c| chunk.column_index(c).is_none()) {
            return Err(AppError::SchemaError(format!("Missing feature column: {}", missing)));
        }

        let labels = chunk
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let raw = row.get(target_idx).map(String::as_str).unwrap_or("");
                parse_label(raw).ok_or_else(|| {
                    AppError::DataError(format!(
                        "Invalid label '{}' in column '{}' at row {}",
                        raw,
                        target_column,
                        chunk.row_offset() + i + 1
                    ))
                })
            })
            .collect::<AppResult<Vec<u8>>>()?;

        let x = encoder.encode(&chunk.select(feature_columns))?;

        for (model, acc) in models.iter().zip(accumulators.iter_mut()) {
            let scores = model.classifier.positive_scores(&x)?;
            acc.add_chunk(&self.options.thresholds, &labels, &scores)?;
        }
        Ok(())
    }
}

/// Binary label from CSV text: 0/1, 0.0/1.0 or true/false
pub fn parse_label(raw: &str) -> Option<u8> {
    let value = raw.trim().to_ascii_lowercase();
    match value.as_str() {
        "1" | "true" => Some(1),
        "0" | "false" => Some(0),
        other => match other.parse::<f64>() {
            Ok(v) if v == 1.0 => Some(1),
            Ok(v) if v == 0.0 => Some(0),
            _ => None,
        },
    }
}
