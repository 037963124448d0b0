//! Decision Threshold Search
//!
//! Scans a fixed grid of probability cut-offs for the best F1.
//! The 0.5 baseline is kept unless a grid point strictly beats it.

use serde::{Deserialize, Serialize};

use crate::models::Metrics;
use crate::registry::classifier::DECISION_BOUNDARY;
use super::metrics::ConfusionCounts;

/// Threshold grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Fixed decision boundary reported as the standard metrics
    pub baseline: f64,

    /// Grid step; candidates are step, 2*step, ... below 1.0
    pub step_percent: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            baseline: DECISION_BOUNDARY,
            step_percent: 5,
        }
    }
}

impl ThresholdConfig {
    /// Candidate thresholds in ascending order: 0.05, 0.10, ..., 0.95
    pub fn candidates(&self) -> Vec<f64> {
        let step = self.step_percent.max(1);
        (1..)
            .map(|i| i * step)
            .take_while(|&p| p < 100)
            .map(|p| f64::from(p) / 100.0)
            .collect()
    }
}

/// Outcome of a threshold search for one model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdOutcome {
    pub threshold: f64,
    /// Metrics at `threshold`
    pub best: Metrics,
    /// Metrics at the baseline
    pub standard: Metrics,
}

impl ThresholdOutcome {
    /// No search performed: the baseline is the answer
    pub fn baseline_only(config: &ThresholdConfig, counts: &ConfusionCounts) -> Self {
        let standard = counts.metrics();
        Self {
            threshold: config.baseline,
            best: standard,
            standard,
        }
    }
}

/// Pick the F1-optimal threshold over retained scores.
///
/// Ascending scan; a candidate replaces the current best only on a strictly
/// higher F1, so the first maximum wins and ties with 0.5 keep 0.5.
pub fn search(config: &ThresholdConfig, labels: &[u8], scores: &[f64]) -> ThresholdOutcome {
    let standard = ConfusionCounts::from_scores(labels, scores, config.baseline).metrics();

    let mut threshold = config.baseline;
    let mut best = standard;
    for candidate in config.candidates() {
        let metrics = ConfusionCounts::from_scores(labels, scores, candidate).metrics();
        if metrics.f1 > best.f1 {
            threshold = candidate;
            best = metrics;
        }
    }

    ThresholdOutcome { threshold, best, standard }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_grid() {
        let grid = ThresholdConfig::default().candidates();
        assert_eq!(grid.len(), 19);
        assert_eq!(grid[0], 0.05);
        assert_eq!(grid[6], 0.35);
        assert_eq!(grid[18], 0.95);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_worked_example_selects_035() {
        let outcome = search(
            &ThresholdConfig::default(),
            &[1, 1, 0, 0],
            &[0.9, 0.4, 0.3, 0.6],
        );

        assert_eq!(outcome.standard.f1, 0.5);
        assert_eq!(outcome.threshold, 0.35);
        assert_eq!((outcome.best.tp, outcome.best.fp, outcome.best.fn_count, outcome.best.tn), (2, 1, 0, 1));
        assert!((outcome.best.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(outcome.best.recall, 1.0);
        assert!((outcome.best.f1 - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_baseline_kept_when_nothing_beats_it() {
        // Perfectly separated at 0.5; many grid points tie, none beat it
        let outcome = search(&ThresholdConfig::default(), &[1, 0], &[0.9, 0.1]);
        assert_eq!(outcome.threshold, 0.5);
        assert_eq!(outcome.best, outcome.standard);
    }

    #[test]
    fn test_first_maximum_wins() {
        // 0.5 misses both positives; 0.15 through 0.30 are all perfect
        let outcome = search(&ThresholdConfig::default(), &[1, 0, 1], &[0.3, 0.1, 0.45]);
        assert_eq!(outcome.standard.f1, 0.0);
        assert_eq!(outcome.threshold, 0.15);
        assert_eq!(outcome.best.f1, 1.0);
    }

    #[test]
    fn test_optimized_never_worse_than_standard() {
        let labels = [1, 0, 1, 0, 1, 1, 0, 0, 1, 0];
        let scores = [0.12, 0.33, 0.41, 0.58, 0.66, 0.72, 0.09, 0.91, 0.27, 0.5];
        let config = ThresholdConfig::default();
        let outcome = search(&config, &labels, &scores);

        assert!(outcome.standard.f1 <= outcome.best.f1);
        assert!(outcome.threshold == 0.5 || config.candidates().contains(&outcome.threshold));
    }

    #[test]
    fn test_baseline_only() {
        let counts = ConfusionCounts { tn: 3, fp: 1, fn_count: 0, tp: 2 };
        let outcome = ThresholdOutcome::baseline_only(&ThresholdConfig::default(), &counts);
        assert_eq!(outcome.threshold, 0.5);
        assert_eq!(outcome.best, outcome.standard);
    }
}
