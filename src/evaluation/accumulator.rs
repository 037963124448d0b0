//! Per-model accumulation across chunks
//!
//! `Scores` keeps every (label, score) pair so thresholds can be searched
//! after the last chunk; memory grows with the row count. `Counts` folds
//! each chunk into a 2x2 matrix at the baseline and stays constant-size.

use crate::{AppError, AppResult};
use super::metrics::ConfusionCounts;
use super::threshold::{self, ThresholdConfig, ThresholdOutcome};

#[derive(Debug, Clone)]
pub enum ConfusionAccumulator {
    Scores { labels: Vec<u8>, scores: Vec<f64> },
    Counts(ConfusionCounts),
}

impl ConfusionAccumulator {
    pub fn retaining() -> Self {
        ConfusionAccumulator::Scores {
            labels: Vec::new(),
            scores: Vec::new(),
        }
    }

    pub fn counting() -> Self {
        ConfusionAccumulator::Counts(ConfusionCounts::default())
    }

    pub fn add_chunk(&mut self, config: &ThresholdConfig, chunk_labels: &[u8], chunk_scores: &[f64]) -> AppResult<()> {
        if chunk_labels.len() != chunk_scores.len() {
            return Err(AppError::InternalError(format!(
                "{} labels but {} scores in chunk",
                chunk_labels.len(),
                chunk_scores.len()
            )));
        }

        match self {
            ConfusionAccumulator::Scores { labels, scores } => {
                labels.extend_from_slice(chunk_labels);
                scores.extend_from_slice(chunk_scores);
            }
            ConfusionAccumulator::Counts(counts) => {
                counts.merge(&ConfusionCounts::from_scores(chunk_labels, chunk_scores, config.baseline));
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        match self {
            ConfusionAccumulator::Scores { labels, .. } => labels.len() as u64,
            ConfusionAccumulator::Counts(counts) => counts.total(),
        }
    }

    pub fn finish(&self, config: &ThresholdConfig) -> ThresholdOutcome {
        match self {
            ConfusionAccumulator::Scores { labels, scores } => threshold::search(config, labels, scores),
            ConfusionAccumulator::Counts(counts) => ThresholdOutcome::baseline_only(config, counts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_matches_retaining_at_baseline() {
        let config = ThresholdConfig::default();
        let mut retain = ConfusionAccumulator::retaining();
        let mut count = ConfusionAccumulator::counting();

        for (labels, scores) in [(&[1u8, 0][..], &[0.7, 0.2][..]), (&[1, 1, 0][..], &[0.4, 0.5, 0.6][..])] {
            retain.add_chunk(&config, labels, scores).unwrap();
            count.add_chunk(&config, labels, scores).unwrap();
        }

        assert_eq!(retain.rows(), 5);
        assert_eq!(count.rows(), 5);
        assert_eq!(retain.finish(&config).standard, count.finish(&config).standard);
        assert_eq!(count.finish(&config).threshold, 0.5);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let mut acc = ConfusionAccumulator::retaining();
        let result = acc.add_chunk(&ThresholdConfig::default(), &[1, 0], &[0.5]);
        assert!(result.is_err());
    }
}
