//! Batch evaluation report

use serde::Serialize;

/// Confusion-matrix derived scores at one decision threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub tn: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_count: u64,
    pub tp: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelEvaluation {
    pub model_id: String,
    pub technique: String,
    /// Metrics at `optimal_threshold`
    pub metrics: Metrics,
    /// Metrics at the fixed 0.5 boundary
    pub standard_metrics: Metrics,
    pub optimal_threshold: f64,
    pub rows: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub results: Vec<ModelEvaluation>,
}
