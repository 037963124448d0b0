//! Classifier capabilities
//!
//! Whether a model can emit probabilities is decided once, when the
//! artifact is loaded, and carried as the `Classifier` variant.

use std::fmt::Debug;

use crate::features::FeatureMatrix;
use crate::{AppError, AppResult};

/// Default cut-off on P(class 1); a score equal to it is positive
pub const DECISION_BOUNDARY: f64 = 0.5;

/// Hard label for a positive-class score under the default cut-off
pub fn label_for_score(p1: f64) -> u8 {
    u8::from(p1 >= DECISION_BOUNDARY)
}

// ============================================================================
// PREDICTOR TRAITS
// ============================================================================

/// Anything that maps feature rows to hard 0/1 labels
pub trait Predictor: Debug + Send + Sync {
    /// Number of columns the model was trained on, if it is fixed
    fn n_features(&self) -> Option<usize>;

    fn predict(&self, x: &FeatureMatrix) -> AppResult<Vec<u8>>;
}

/// A predictor that can also emit per-class probabilities `[p0, p1]`
pub trait ProbabilisticPredictor: Predictor {
    fn predict_proba(&self, x: &FeatureMatrix) -> AppResult<Vec<Vec<f64>>>;
}

// ============================================================================
// CLASSIFIER
// ============================================================================

#[derive(Debug)]
pub enum Classifier {
    Probabilistic(Box<dyn ProbabilisticPredictor>),
    HardLabel(Box<dyn Predictor>),
}

impl Classifier {
    pub fn is_probabilistic(&self) -> bool {
        matches!(self, Classifier::Probabilistic(_))
    }

    pub fn n_features(&self) -> Option<usize> {
        match self {
            Classifier::Probabilistic(model) => model.n_features(),
            Classifier::HardLabel(model) => model.n_features(),
        }
    }

    pub fn predict(&self, x: &FeatureMatrix) -> AppResult<Vec<u8>> {
        match self {
            Classifier::Probabilistic(model) => model.predict(x),
            Classifier::HardLabel(model) => model.predict(x),
        }
    }

    /// Probability output, `None` for hard-label models
    pub fn predict_proba(&self, x: &FeatureMatrix) -> Option<AppResult<Vec<Vec<f64>>>> {
        match self {
            Classifier::Probabilistic(model) => Some(model.predict_proba(x)),
            Classifier::HardLabel(_) => None,
        }
    }

    /// Positive-class score per row.
    ///
    /// Uses column 1 of the probability output when it is well formed;
    /// otherwise the hard label cast to `f64`.
    pub fn positive_scores(&self, x: &FeatureMatrix) -> AppResult<Vec<f64>> {
        if let Some(result) = self.predict_proba(x) {
            match result {
                Ok(proba) => match positive_column(&proba, x.len()) {
                    Some(scores) => return Ok(scores),
                    None => tracing::debug!("Malformed probability output, using hard labels"),
                },
                Err(e) => tracing::debug!("predict_proba failed ({}), using hard labels", e),
            }
        }

        Ok(self.predict(x)?.into_iter().map(f64::from).collect())
    }
}

fn positive_column(proba: &[Vec<f64>], expected_rows: usize) -> Option<Vec<f64>> {
    if proba.len() != expected_rows {
        return None;
    }
    proba
        .iter()
        .map(|row| match row.as_slice() {
            [_, p1] if p1.is_finite() => Some(*p1),
            _ => None,
        })
        .collect()
}

/// Reject matrices whose width differs from what the model was fit on
pub fn check_width(x: &FeatureMatrix, expected: usize) -> AppResult<()> {
    if x.width() != expected {
        return Err(AppError::DataError(format!(
            "Model expects {} features, got {} ({})",
            expected,
            x.width(),
            x.columns().join(", ")
        )));
    }
    Ok(())
}
