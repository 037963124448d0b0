//! Confusion matrix and derived metrics

use crate::models::Metrics;

/// Running 2x2 count matrix for binary labels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub tn: u64,
    pub fp: u64,
    pub fn_count: u64,
    pub tp: u64,
}

impl ConfusionCounts {
    pub fn record(&mut self, label: u8, predicted: bool) {
        match (label == 1, predicted) {
            (true, true) => self.tp += 1,
            (false, true) => self.fp += 1,
            (true, false) => self.fn_count += 1,
            (false, false) => self.tn += 1,
        }
    }

    /// Counts for `score >= threshold` as the positive decision
    pub fn from_scores(labels: &[u8], scores: &[f64], threshold: f64) -> Self {
        let mut counts = Self::default();
        for (&label, &score) in labels.iter().zip(scores) {
            counts.record(label, score >= threshold);
        }
        counts
    }

    pub fn merge(&mut self, other: &ConfusionCounts) {
        self.tn += other.tn;
        self.fp += other.fp;
        self.fn_count += other.fn_count;
        self.tp += other.tp;
    }

    pub fn total(&self) -> u64 {
        self.tn + self.fp + self.fn_count + self.tp
    }

    /// Accuracy, precision, recall and F1; 0.0 whenever a denominator is 0
    pub fn metrics(&self) -> Metrics {
        let tp = self.tp as f64;
        let fp = self.fp as f64;
        let fn_ = self.fn_count as f64;

        Metrics {
            accuracy: ratio((self.tp + self.tn) as f64, self.total() as f64),
            precision: ratio(tp, tp + fp),
            recall: ratio(tp, tp + fn_),
            f1: ratio(2.0 * tp, 2.0 * tp + fp + fn_),
            tn: self.tn,
            fp: self.fp,
            fn_count: self.fn_count,
            tp: self.tp,
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_at_half() {
        let counts = ConfusionCounts::from_scores(&[1, 1, 0, 0], &[0.9, 0.4, 0.3, 0.6], 0.5);
        assert_eq!(counts, ConfusionCounts { tn: 1, fp: 1, fn_count: 1, tp: 1 });

        let m = counts.metrics();
        assert_eq!(m.accuracy, 0.5);
        assert_eq!(m.precision, 0.5);
        assert_eq!(m.recall, 0.5);
        assert_eq!(m.f1, 0.5);
    }

    #[test]
    fn test_zero_denominators_are_zero() {
        let m = ConfusionCounts::default().metrics();
        assert_eq!((m.accuracy, m.precision, m.recall, m.f1), (0.0, 0.0, 0.0, 0.0));

        // Only negatives, all predicted negative: precision/recall/F1 undefined
        let m = ConfusionCounts::from_scores(&[0, 0], &[0.1, 0.2], 0.5).metrics();
        assert_eq!(m.accuracy, 1.0);
        assert_eq!((m.precision, m.recall, m.f1), (0.0, 0.0, 0.0));
        assert!(!m.f1.is_nan());
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let labels = [1, 0, 1, 1, 0, 0, 1];
        let scores = [0.8, 0.6, 0.2, 0.55, 0.1, 0.5, 0.9];

        let whole = ConfusionCounts::from_scores(&labels, &scores, 0.5);
        let mut merged = ConfusionCounts::from_scores(&labels[..3], &scores[..3], 0.5);
        merged.merge(&ConfusionCounts::from_scores(&labels[3..], &scores[3..], 0.5));

        assert_eq!(whole, merged);
        assert_eq!(whole.total(), 7);
    }
}
