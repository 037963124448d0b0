//! Evaluation Module - Batch scoring of labeled CSV uploads
//!
//! Reads the upload in fixed-size chunks, encodes each chunk, runs the
//! requested classifiers and folds the results into per-model
//! accumulators. Metrics and the F1-optimal threshold are computed once
//! the stream is exhausted.

pub mod chunks;
pub mod metrics;
pub mod threshold;
pub mod accumulator;
pub mod engine;

#[cfg(test)]
mod tests;

// Re-export common types
pub use engine::{EvaluationEngine, EvaluationOptions};
